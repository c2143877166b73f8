use log::{debug, info, warn};
use serde::Deserialize;
use serde_json::Number;
use ureq::Agent;

use crate::Error;
use crate::dates::DateToken;
use crate::document::{RateEntry, RateMap, decimal_from_number};

pub const PRIVATBANK_BASE_URL: &str = "https://api.privatbank.ua/p24api/exchange_rates";

/// Daily archive response. Only the rows are kept.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExchangeRatesResponse {
    #[serde(default)]
    pub exchange_rate: Vec<RawRate>,
}

/// One row of the archive. Rows without NBU rates (the base currency row, for instance) lack
/// some of these fields.
#[derive(Debug, Deserialize)]
pub struct RawRate {
    pub currency: Option<String>,
    #[serde(rename = "saleRateNB")]
    pub sale_rate_nb: Option<Number>,
    #[serde(rename = "purchaseRateNB")]
    pub purchase_rate_nb: Option<Number>,
}

impl RawRate {
    fn into_entry(self) -> Option<(String, RateEntry)> {
        let (Some(currency), Some(sale), Some(purchase)) =
            (self.currency, self.sale_rate_nb, self.purchase_rate_nb)
        else {
            return None;
        };

        match (decimal_from_number(&sale), decimal_from_number(&purchase)) {
            (Ok(sale), Ok(purchase)) => Some((currency, RateEntry { sale, purchase })),
            (Err(e), _) | (_, Err(e)) => {
                warn!("skipping {currency}: rate out of range ({e})");
                None
            }
        }
    }
}

/// Keep the rows carrying a currency code with both NBU rates.
pub fn extract_rates(response: ExchangeRatesResponse) -> RateMap {
    let total = response.exchange_rate.len();
    let rates: RateMap = response
        .exchange_rate
        .into_iter()
        .filter_map(RawRate::into_entry)
        .collect();

    debug!("kept {} of {total} rows", rates.len());
    rates
}

/// Fetches one date at a time over a single HTTP agent.
pub struct RateFetcher {
    agent: Agent,
    url: String,
}

impl RateFetcher {
    pub fn new(url: impl Into<String>) -> Self {
        // Statuses are inspected by `fetch` instead of surfacing as transport errors
        let agent: Agent = Agent::config_builder()
            .http_status_as_error(false)
            .build()
            .into();

        Self {
            agent,
            url: url.into(),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// NBU rates for `date`. Any status other than 200 is returned as [`Error::Status`].
    pub fn fetch(&self, date: DateToken) -> Result<RateMap, Error> {
        debug!("requesting {} for {date}", self.url);
        let http_error = |source| Error::Http { date, source };

        let mut resp = self
            .agent
            .get(self.url.as_str())
            .query("json", "")
            .query("date", date.to_string())
            .call()
            .map_err(http_error)?;

        let status = resp.status().as_u16();
        if status != 200 {
            return Err(Error::Status { date, status });
        }

        let rates = extract_rates(
            resp.body_mut()
                .read_json::<ExchangeRatesResponse>()
                .map_err(http_error)?,
        );
        info!("{date}: {} currencies", rates.len());
        Ok(rates)
    }
}
