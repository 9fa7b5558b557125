// crates/shared/src/toolbelts/stock_quote.rs

use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use once_cell::sync::Lazy;
use serde_json::{Map, Value};
use tracing::debug;

use crate::quotes::PriceLookup;
use crate::registry::Capability;
use crate::schemas::{CapabilityResult, ParameterSchema, ToolSchema};

pub const STOCK_PRICE_KEY: &str = "stock_price";

static SCHEMA: Lazy<ToolSchema> = Lazy::new(|| ToolSchema {
    name: "get_stock_price",
    description: "Get the latest price of a stock",
    parameters: vec![ParameterSchema {
        name: "symbol",
        type_name: "string",
        description: "The stock symbol to look up.",
        required: true,
    }],
});

/// `get_stock_price`: live quote for a ticker symbol.
pub struct StockQuote {
    lookup: Arc<dyn PriceLookup>,
}

impl StockQuote {
    pub fn new(lookup: Arc<dyn PriceLookup>) -> Self {
        Self { lookup }
    }
}

#[async_trait]
impl Capability for StockQuote {
    fn schema(&self) -> &ToolSchema {
        &SCHEMA
    }

    async fn invoke(&self, args: &Map<String, Value>) -> Result<CapabilityResult> {
        let symbol = args
            .get("symbol")
            .and_then(Value::as_str)
            .ok_or_else(|| anyhow::anyhow!("symbol not found in function call arguments"))?;

        let price = self.lookup.lookup_price(symbol).await?;
        debug!(symbol, price, "fetched stock price");

        Ok(CapabilityResult::with(STOCK_PRICE_KEY, price))
    }
}
