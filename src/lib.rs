use std::io::{self, BufRead, Write};
use std::path::PathBuf;

use clap::Parser;
use log::warn;

pub mod currencies;
pub mod dates;
pub mod document;
mod error;
pub mod fetch;
#[cfg(test)]
mod test_server;

pub use currencies::{CurrencyFilter, prompt_currencies};
pub use dates::{DateInputError, DateToken, prompt_dates};
pub use document::{ExchangeDocument, RateEntry, RateMap};
pub use error::Error;
pub use fetch::{PRIVATBANK_BASE_URL, RateFetcher};

/// Get the NBU exchange rates published by PrivatBank for a single date, or a range.
///
/// Rates are saved to a JSON file, then printed back, optionally limited to some currencies.
/// Dates and currencies not given as arguments are asked for interactively.
#[derive(Parser)]
pub struct Cli {
    /// A single date, or start date of the range (format: dd.mm.yyyy)
    #[arg(value_name = "DATE")]
    pub start_date: Option<DateToken>,
    /// End date of the range (format: dd.mm.yyyy)
    #[arg(value_name = "DATE", requires = "start_date")]
    pub end_date: Option<DateToken>,

    /// Currencies to print, separated by commas (e.g. USD,EUR)
    #[clap(short, long, value_delimiter = ',')]
    pub currencies: Option<Vec<String>>,

    /// File the rates are saved to
    #[clap(short, long, default_value = "data.json")]
    pub output: PathBuf,

    /// Exchange rate archive endpoint
    #[clap(long, default_value = PRIVATBANK_BASE_URL)]
    pub url: String,
}

/// Run against the process console.
pub fn run(args: &Cli) -> Result<(), Error> {
    let mut input = io::stdin().lock();
    let mut output = io::stdout().lock();
    run_with(args, &mut input, &mut output)
}

/// Resolve dates, fetch and save their rates, then print the saved file.
pub fn run_with<R: BufRead, W: Write>(
    args: &Cli,
    input: &mut R,
    output: &mut W,
) -> Result<(), Error> {
    let dates = match args.start_date {
        Some(start) => dates::resolve(start, args.end_date)?,
        None => prompt_dates(input, output)?,
    };

    let document = collect_rates(&RateFetcher::new(args.url.as_str()), &dates)?;
    document.write_to(&args.output)?;
    writeln!(
        output,
        "The data was successfully written to {}.",
        args.output.display()
    )?;

    let filter = match &args.currencies {
        Some(codes) => CurrencyFilter::only(codes),
        None => prompt_currencies(input, output)?,
    };

    ExchangeDocument::read_from(&args.output)?.print(&filter, output)?;
    Ok(())
}

/// Fetch every date in order. A date the service has no answer for is kept with no rates.
pub fn collect_rates(fetcher: &RateFetcher, dates: &[DateToken]) -> Result<ExchangeDocument, Error> {
    let mut document = ExchangeDocument::new();
    for &date in dates {
        let rates = match fetcher.fetch(date) {
            Ok(rates) => rates,
            Err(Error::Status { status, .. }) => {
                warn!("no rates for {date}: {} answered {status}", fetcher.url());
                RateMap::new()
            }
            Err(e) => return Err(e),
        };
        document.insert(date, rates);
    }
    Ok(document)
}

/// Print `prompt` and read one line of the answer.
pub(crate) fn ask<R: BufRead, W: Write>(
    input: &mut R,
    output: &mut W,
    prompt: &str,
) -> io::Result<String> {
    write!(output, "{prompt}")?;
    output.flush()?;

    let mut line = String::new();
    if input.read_line(&mut line)? == 0 {
        return Err(io::Error::new(
            io::ErrorKind::UnexpectedEof,
            "input ended before an answer was given",
        ));
    }
    Ok(line)
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;
    use std::path::Path;

    use jiff::civil::date;
    use tempfile::tempdir;

    use crate::{Cli, DateToken, Error, ExchangeDocument, run_with, test_server};

    const USD_ONLY: &str = r#"{"exchangeRate": [
        {"baseCurrency": "UAH", "saleRateNB": 1.0, "purchaseRateNB": 1.0},
        {"currency": "USD", "saleRateNB": 38.0, "purchaseRateNB": 37.5},
        {"currency": "EUR", "saleRateNB": 41.5, "purchaseRateNB": 41.25}
    ]}"#;

    fn cli(url: String, output: &Path) -> Cli {
        Cli {
            start_date: None,
            end_date: None,
            currencies: None,
            output: output.to_path_buf(),
            url,
        }
    }

    /// Interactive run over two dates, the second of which the service cannot answer.
    #[test]
    fn test_interactive_run() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("data.json");
        let (url, server) =
            test_server::serve(vec![(200, USD_ONLY.to_string()), (404, "{}".to_string())]);

        let mut input = Cursor::new("bad\n01.01.2024 02.01.2024\ny\nusd\n");
        let mut output = Vec::new();
        run_with(&cli(url, &path), &mut input, &mut output).unwrap();

        let requests = server.join().unwrap();
        assert!(requests[0].contains("date=01.01.2024"));
        assert!(requests[1].contains("date=02.01.2024"));

        let output = String::from_utf8(output).unwrap();
        assert!(output.contains("Error: Invalid date format 'bad'."));
        assert!(output.contains(&format!(
            "The data was successfully written to {}.",
            path.display()
        )));
        assert!(output.ends_with(
            "date: 01.01.2024\n\
             USD: sale - 38.0, purchase - 37.5\n\
             \n\
             date: 02.01.2024\n\
             \n"
        ));

        let document = ExchangeDocument::read_from(&path).unwrap();
        assert_eq!(document.len(), 2);
        let first = document.get(&date(2024, 1, 1).into()).unwrap();
        assert_eq!(first.keys().collect::<Vec<_>>(), vec!["EUR", "USD"]);
        assert!(document.get(&date(2024, 1, 2).into()).unwrap().is_empty());
    }

    #[test]
    fn test_arguments_skip_prompts() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("rates.json");
        let (url, server) = test_server::serve(vec![(200, USD_ONLY.to_string())]);

        let args = Cli {
            start_date: Some(date(2024, 6, 1).into()),
            currencies: Some(vec!["EUR".to_string()]),
            ..cli(url, &path)
        };
        let mut input = Cursor::new("");
        let mut output = Vec::new();
        run_with(&args, &mut input, &mut output).unwrap();
        server.join().unwrap();

        let output = String::from_utf8(output).unwrap();
        assert!(!output.contains("Enter a date range"));
        assert!(!output.contains("Want to select"));
        assert!(output.ends_with("date: 01.06.2024\nEUR: sale - 41.5, purchase - 41.25\n\n"));
    }

    #[test]
    fn test_reversed_arguments_are_fatal() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("data.json");

        let args = Cli {
            start_date: Some(DateToken::from(date(2024, 1, 3))),
            end_date: Some(DateToken::from(date(2024, 1, 1))),
            ..cli("http://127.0.0.1:9/unused".to_string(), &path)
        };
        let result = run_with(&args, &mut Cursor::new(""), &mut Vec::new());
        assert!(matches!(result, Err(Error::DateInput(_))));
        assert!(!path.exists());
    }
}
