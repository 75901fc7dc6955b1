//! WeatherAPI.com forecast source.

use super::{ensure_success, validate_iso_date, WeatherSource};
use crate::config::WeatherSettings;
use crate::error::{BriefError, Result};
use crate::models::Weather;
use async_trait::async_trait;
use serde_json::Value;
use tracing::{debug, instrument};

/// Forecast lookup against WeatherAPI.com.
pub struct WeatherApi {
    http: reqwest::Client,
    api_key: Option<String>,
    location: String,
    base_url: String,
}

impl WeatherApi {
    pub fn new(http: reqwest::Client, settings: &WeatherSettings) -> Self {
        Self {
            http,
            api_key: settings.api_key.clone(),
            location: settings.location.clone(),
            base_url: settings.base_url.trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl WeatherSource for WeatherApi {
    #[instrument(skip(self))]
    async fn forecast(&self, iso_date: &str) -> Result<Weather> {
        validate_iso_date(iso_date)?;

        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| BriefError::Config("WEATHER_API_KEY not set".to_string()))?;

        let url = format!("{}/forecast.json", self.base_url);
        debug!("Fetching forecast for {}", self.location);

        let resp = self
            .http
            .get(&url)
            .query(&[
                ("key", api_key),
                ("q", self.location.as_str()),
                ("days", "1"),
                ("aqi", "no"),
                ("alerts", "no"),
            ])
            .send()
            .await?;
        let data: Value = ensure_success(resp, "WeatherAPI").await?.json().await?;

        parse_forecast(&data)
    }
}

/// Extract the first forecast day, defaulting missing fields to zero.
fn parse_forecast(data: &Value) -> Result<Weather> {
    let day = data["forecast"]["forecastday"]
        .as_array()
        .and_then(|days| days.first())
        .map(|d| &d["day"])
        .ok_or_else(|| BriefError::Provider("WeatherAPI returned no forecast days".to_string()))?;

    let rain = day["daily_chance_of_rain"]
        .as_f64()
        .or_else(|| day["daily_chance_of_rain"].as_str().and_then(|s| s.parse().ok()))
        .unwrap_or(0.0);

    Ok(Weather {
        min_c: day["mintemp_c"].as_f64().unwrap_or(0.0),
        max_c: day["maxtemp_c"].as_f64().unwrap_or(0.0),
        rain_chance_pct: rain.round().clamp(0.0, 100.0) as u8,
    })
}
