//! Exchange rate and index quote source.
//!
//! With a Financial Modeling Prep key the keyed provider supplies both
//! figures. Without one, exchangerate.host supplies the rate and Yahoo
//! Finance supplies the index close. Missing fields read as zero.

use super::{ensure_success, MarketSource};
use crate::config::MarketSettings;
use crate::error::Result;
use crate::models::Financials;
use async_trait::async_trait;
use serde_json::Value;
use tracing::{debug, instrument};

const FX_PAIR: &str = "AUD/USD";
const INDEX_SYMBOL: &str = "^IXIC";

/// Market data fetched from the keyed or the keyless providers.
pub struct MarketData {
    http: reqwest::Client,
    api_key: Option<String>,
    fmp_base: String,
    fx_base: String,
    quote_base: String,
}

impl MarketData {
    pub fn new(http: reqwest::Client, settings: &MarketSettings) -> Self {
        Self {
            http,
            api_key: settings.api_key.clone(),
            fmp_base: settings.fmp_base.trim_end_matches('/').to_string(),
            fx_base: settings.fx_base.trim_end_matches('/').to_string(),
            quote_base: settings.quote_base.trim_end_matches('/').to_string(),
        }
    }

    async fn get_json(&self, url: &str, query: &[(&str, &str)], what: &str) -> Result<Value> {
        let resp = self.http.get(url).query(query).send().await?;
        Ok(ensure_success(resp, what).await?.json().await?)
    }

    async fn fetch_keyed(&self, api_key: &str) -> Result<Financials> {
        debug!("Using keyed market provider");
        let forex = self
            .get_json(
                &format!("{}/api/v3/forex", self.fmp_base),
                &[("apikey", api_key)],
                "FMP forex",
            )
            .await?;
        let quote = self
            .get_json(
                &format!("{}/api/v3/quote/{}", self.fmp_base, INDEX_SYMBOL),
                &[("apikey", api_key)],
                "FMP quote",
            )
            .await?;

        Ok(Financials {
            aud_usd: fmp_rate(&forex),
            nasdaq_close: fmp_previous_close(&quote),
        })
    }

    async fn fetch_keyless(&self) -> Result<Financials> {
        debug!("Using keyless market providers");
        let fx = self
            .get_json(
                &format!("{}/latest", self.fx_base),
                &[("base", "AUD"), ("symbols", "USD")],
                "exchangerate.host",
            )
            .await?;
        let quote = self
            .get_json(
                &format!("{}/v7/finance/quote", self.quote_base),
                &[("symbols", INDEX_SYMBOL)],
                "Yahoo Finance",
            )
            .await?;

        Ok(Financials {
            aud_usd: fx["rates"]["USD"].as_f64().unwrap_or(0.0),
            nasdaq_close: quote["quoteResponse"]["result"][0]["regularMarketPreviousClose"]
                .as_f64()
                .unwrap_or(0.0),
        })
    }
}

#[async_trait]
impl MarketSource for MarketData {
    #[instrument(skip(self))]
    async fn financials(&self) -> Result<Financials> {
        match self.api_key.as_deref() {
            Some(key) => self.fetch_keyed(key).await,
            None => self.fetch_keyless().await,
        }
    }
}

fn fmp_rate(forex: &Value) -> f64 {
    forex
        .as_array()
        .and_then(|pairs| {
            pairs.iter().find(|p| {
                p["symbol"]
                    .as_str()
                    .is_some_and(|s| s == FX_PAIR || s == "AUDUSD")
            })
        })
        .and_then(|p| p["mid"].as_f64())
        .unwrap_or(0.0)
}

fn fmp_previous_close(quote: &Value) -> f64 {
    quote[0]["previousClose"].as_f64().unwrap_or(0.0)
}
