// crates/shared/src/quotes/mod.rs
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Deserialize;

/// Source of live stock quotes.
#[async_trait]
pub trait PriceLookup: Send + Sync {
    async fn lookup_price(&self, symbol: &str) -> Result<f64>;
}

const USER_AGENT: &str = "Mozilla/5.0 (X11; Linux x86_64; rv:120.0) Gecko/20100101 Firefox/120.0";

/// Live prices from the Yahoo Finance chart API.
pub struct YahooFinance {
    client: reqwest::Client,
    base_url: String,
}

impl YahooFinance {
    pub const DEFAULT_BASE_URL: &'static str = "https://query1.finance.yahoo.com";

    pub fn new(base_url: impl Into<String>, timeout: Option<Duration>) -> Result<Self> {
        let mut builder = reqwest::Client::builder().user_agent(USER_AGENT);
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }

        Ok(Self {
            client: builder.build().context("failed to build quote client")?,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    fn chart_url(&self, symbol: &str) -> String {
        format!(
            "{}/v8/finance/chart/{}",
            self.base_url,
            urlencoding::encode(symbol)
        )
    }
}

#[async_trait]
impl PriceLookup for YahooFinance {
    async fn lookup_price(&self, symbol: &str) -> Result<f64> {
        let response = self
            .client
            .get(self.chart_url(symbol))
            .query(&[("interval", "1d"), ("range", "1d")])
            .send()
            .await
            .with_context(|| format!("quote request for {} failed", symbol))?;

        // Unknown symbols come back as 404 with an error body worth reporting.
        let status = response.status();
        let body = response
            .text()
            .await
            .context("quote response read failed")?;

        parse_chart_price(symbol, &body)
            .with_context(|| format!("quote service returned {}", status))
    }
}

#[derive(Deserialize, Debug)]
struct ChartEnvelope {
    chart: Chart,
}

#[derive(Deserialize, Debug)]
struct Chart {
    #[serde(default)]
    result: Option<Vec<ChartResult>>,
    #[serde(default)]
    error: Option<ChartError>,
}

#[derive(Deserialize, Debug)]
struct ChartError {
    #[serde(default)]
    code: String,
    #[serde(default)]
    description: String,
}

#[derive(Deserialize, Debug)]
struct ChartResult {
    meta: ChartMeta,
    #[serde(default)]
    indicators: Option<Indicators>,
}

#[derive(Deserialize, Debug)]
struct ChartMeta {
    #[serde(rename = "regularMarketPrice", default)]
    regular_market_price: Option<f64>,
}

#[derive(Deserialize, Debug)]
struct Indicators {
    #[serde(default)]
    quote: Vec<QuoteSeries>,
}

#[derive(Deserialize, Debug)]
struct QuoteSeries {
    #[serde(default)]
    close: Vec<Option<f64>>,
}

/// Pulls the live price out of a chart response body.
///
/// Uses `regularMarketPrice` and falls back to the last non-null close.
pub fn parse_chart_price(symbol: &str, body: &str) -> Result<f64> {
    let envelope: ChartEnvelope =
        serde_json::from_str(body).context("quote response decode failed")?;

    if let Some(err) = envelope.chart.error {
        anyhow::bail!("{} lookup failed: {} ({})", symbol, err.description, err.code);
    }

    let result = envelope
        .chart
        .result
        .and_then(|results| results.into_iter().next())
        .ok_or_else(|| anyhow::anyhow!("no quote data for {}", symbol))?;

    if let Some(price) = result.meta.regular_market_price {
        return Ok(price);
    }

    result
        .indicators
        .and_then(|ind| ind.quote.into_iter().next())
        .and_then(|series| series.close.into_iter().rev().flatten().next())
        .ok_or_else(|| anyhow::anyhow!("no price in quote data for {}", symbol))
}
