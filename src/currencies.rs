use std::collections::BTreeSet;
use std::io::{self, BufRead, Write};

const CHOICE_PROMPT: &str = "Want to select specific currencies? (y/n): ";
const CODES_PROMPT: &str =
    "Enter the currencies separated by commas AUD, AZN, BYN, CAD, CNY, EUR, GBP, JPY, USD...: ";

/// Currencies to display. No codes means every currency is displayed.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CurrencyFilter {
    codes: Option<BTreeSet<String>>,
}

impl CurrencyFilter {
    pub fn all() -> Self {
        Self { codes: None }
    }

    /// Only the listed codes, trimmed and upper-cased. Codes are not checked against any list
    /// of real currencies.
    pub fn only<I, S>(codes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            codes: Some(
                codes
                    .into_iter()
                    .map(|code| code.as_ref().trim().to_uppercase())
                    .filter(|code| !code.is_empty())
                    .collect(),
            ),
        }
    }

    /// Parse a comma-separated list such as `usd, eur`.
    pub fn parse_list(list: &str) -> Self {
        Self::only(list.split(','))
    }

    pub fn allows(&self, code: &str) -> bool {
        self.codes.as_ref().is_none_or(|codes| codes.contains(code))
    }

    pub fn codes(&self) -> Option<&BTreeSet<String>> {
        self.codes.as_ref()
    }
}

pub fn prompt_currencies<R: BufRead, W: Write>(
    input: &mut R,
    output: &mut W,
) -> io::Result<CurrencyFilter> {
    let choice = crate::ask(input, output, CHOICE_PROMPT)?;
    if !choice.trim().eq_ignore_ascii_case("y") {
        return Ok(CurrencyFilter::all());
    }

    let list = crate::ask(input, output, CODES_PROMPT)?;
    Ok(CurrencyFilter::parse_list(&list))
}
