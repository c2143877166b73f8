use std::collections::BTreeMap;
use std::fs::File;
use std::io::{self, BufReader, BufWriter, Write};
use std::path::Path;
use std::str::FromStr;

use log::info;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Number;
use serde_json::ser::PrettyFormatter;

use crate::Error;
use crate::currencies::CurrencyFilter;
use crate::dates::DateToken;

/// NBU sale and purchase rate of one currency, in hryvnias.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateEntry {
    #[serde(with = "json_number")]
    pub sale: Decimal,
    #[serde(with = "json_number")]
    pub purchase: Decimal,
}

/// Exact decimal value of a JSON number, going through its shortest text form.
pub(crate) fn decimal_from_number(number: &Number) -> Result<Decimal, rust_decimal::Error> {
    let text = number.to_string();
    Decimal::from_str(&text).or_else(|_| Decimal::from_scientific(&text))
}

/// Decimals stored as plain JSON numbers rather than strings.
mod json_number {
    use std::str::FromStr;

    use rust_decimal::Decimal;
    use serde::{Deserialize, Deserializer, Serialize, Serializer, de, ser};
    use serde_json::Number;

    pub fn serialize<S: Serializer>(value: &Decimal, serializer: S) -> Result<S::Ok, S::Error> {
        Number::from_str(&value.to_string())
            .map_err(<S::Error as ser::Error>::custom)?
            .serialize(serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Decimal, D::Error> {
        let number = Number::deserialize(deserializer)?;
        super::decimal_from_number(&number).map_err(de::Error::custom)
    }
}

/// Currency code to its rates for one date.
pub type RateMap = BTreeMap<String, RateEntry>;

/// Rates of every requested date, as saved to disk.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExchangeDocument {
    days: BTreeMap<DateToken, RateMap>,
}

impl ExchangeDocument {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, date: DateToken, rates: RateMap) {
        self.days.insert(date, rates);
    }

    pub fn get(&self, date: &DateToken) -> Option<&RateMap> {
        self.days.get(date)
    }

    pub fn len(&self) -> usize {
        self.days.len()
    }

    pub fn is_empty(&self) -> bool {
        self.days.is_empty()
    }

    /// Dates in chronological order with their rates.
    pub fn iter(&self) -> impl Iterator<Item = (&DateToken, &RateMap)> {
        self.days.iter()
    }

    /// Save as JSON indented by four spaces, replacing whatever `path` held before.
    pub fn write_to(&self, path: &Path) -> Result<(), Error> {
        let io_error = |source| Error::Io {
            path: path.to_path_buf(),
            source,
        };

        let mut writer = BufWriter::new(File::create(path).map_err(io_error)?);
        let mut serializer =
            serde_json::Serializer::with_formatter(&mut writer, PrettyFormatter::with_indent(b"    "));
        self.serialize(&mut serializer).map_err(|source| Error::Json {
            path: path.to_path_buf(),
            source,
        })?;
        writer.flush().map_err(io_error)?;

        info!("wrote {} dates to {}", self.len(), path.display());
        Ok(())
    }

    pub fn read_from(path: &Path) -> Result<Self, Error> {
        let file = File::open(path).map_err(|source| Error::Io {
            path: path.to_path_buf(),
            source,
        })?;

        serde_json::from_reader(BufReader::new(file)).map_err(|source| Error::Json {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Print one block per date: a `date:` header, a line per allowed currency, then a blank
    /// line. The header is printed even when the filter hides every currency of that date.
    pub fn print<W: Write>(&self, filter: &CurrencyFilter, output: &mut W) -> io::Result<()> {
        for (date, rates) in &self.days {
            writeln!(output, "date: {date}")?;
            for (currency, rate) in rates.iter().filter(|(code, _)| filter.allows(code)) {
                writeln!(
                    output,
                    "{currency}: sale - {}, purchase - {}",
                    rate.sale, rate.purchase
                )?;
            }
            writeln!(output)?;
        }
        Ok(())
    }
}
