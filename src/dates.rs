use std::fmt;
use std::io::{self, BufRead, Write};
use std::str::FromStr;

use jiff::ToSpan;
use jiff::civil::Date;
use jiff::fmt::strtime;
use log::debug;
use serde::{Deserialize, Deserializer, Serialize, Serializer, de};
use thiserror::Error;

/// `strftime` pattern of a date token, e.g. `01.02.2024`.
pub const DATE_FORMAT: &str = "%d.%m.%Y";

const DATE_PROMPT: &str = "Enter a date range in the format 'dd.mm.yyyy' or 'dd.mm.yyyy dd.mm.yyyy': ";

/// A calendar date written as `dd.mm.yyyy`, both on the console and as a key of the saved document.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DateToken(Date);

impl DateToken {
    /// Strict parse of `dd.mm.yyyy`. Dates that do not exist (`31.02.2024`) are rejected.
    pub fn parse(token: &str) -> Result<Self, jiff::Error> {
        Ok(Self(strtime::parse(DATE_FORMAT, token)?.to_date()?))
    }

    pub fn date(&self) -> Date {
        self.0
    }
}

impl From<Date> for DateToken {
    fn from(date: Date) -> Self {
        Self(date)
    }
}

impl FromStr for DateToken {
    type Err = jiff::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for DateToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.strftime(DATE_FORMAT))
    }
}

impl Serialize for DateToken {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for DateToken {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let token = String::deserialize(deserializer)?;
        Self::parse(&token)
            .map_err(|e| de::Error::custom(format!("invalid date '{token}': {e}")))
    }
}

/// Why a line of date input was rejected. The prompt reports it and asks again.
#[derive(Debug, Error)]
pub enum DateInputError {
    #[error("At least one date must be entered.")]
    Empty,

    #[error("Invalid date format '{token}'. Please enter the date in the format 'dd.mm.yyyy'.")]
    Format {
        token: String,
        #[source]
        source: jiff::Error,
    },

    #[error("The start date {start} must not be after the end date {end}.")]
    Reversed { start: DateToken, end: DateToken },
}

fn parse_token(token: &str) -> Result<DateToken, DateInputError> {
    DateToken::parse(token).map_err(|source| DateInputError::Format {
        token: token.to_string(),
        source,
    })
}

/// Every date from `start` to `end`, both included, in ascending order.
pub fn date_range(start: DateToken, end: DateToken) -> Result<Vec<DateToken>, DateInputError> {
    if start > end {
        return Err(DateInputError::Reversed { start, end });
    }

    Ok(start
        .0
        .series(1.day())
        .take_while(|date| *date <= end.0)
        .map(DateToken)
        .collect())
}

/// Resolve a start date and an optional end date into the dates to fetch.
pub fn resolve(start: DateToken, end: Option<DateToken>) -> Result<Vec<DateToken>, DateInputError> {
    match end {
        None => Ok(vec![start]),
        Some(end) => date_range(start, end),
    }
}

/// Resolve one line of user input: a single date, or a start and end date separated by
/// whitespace. Tokens past the second are ignored.
pub fn resolve_tokens(line: &str) -> Result<Vec<DateToken>, DateInputError> {
    let mut tokens = line.split_whitespace();
    let start = match tokens.next() {
        Some(token) => parse_token(token)?,
        None => return Err(DateInputError::Empty),
    };
    let end = tokens.next().map(parse_token).transpose()?;

    resolve(start, end)
}

/// Ask for dates until the answer resolves.
///
/// Only console I/O errors are returned, including [`io::ErrorKind::UnexpectedEof`] when input
/// runs out before a valid answer.
pub fn prompt_dates<R: BufRead, W: Write>(
    input: &mut R,
    output: &mut W,
) -> io::Result<Vec<DateToken>> {
    loop {
        let line = crate::ask(input, output, DATE_PROMPT)?;
        match resolve_tokens(&line) {
            Ok(dates) => return Ok(dates),
            Err(reason) => {
                debug!("rejected date input {line:?}: {reason:?}");
                writeln!(output, "Error: {reason}")?;
            }
        }
    }
}
