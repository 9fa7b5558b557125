//! Fakes shared by unit tests in this crate.

use std::sync::Mutex;

use anyhow::Result;
use async_trait::async_trait;

use crate::quotes::PriceLookup;

/// Price lookup that records every symbol it is asked for.
pub struct RecordingLookup {
    outcome: std::result::Result<f64, String>,
    calls: Mutex<Vec<String>>,
}

impl RecordingLookup {
    pub fn returning(price: f64) -> Self {
        Self {
            outcome: Ok(price),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn failing(message: &str) -> Self {
        Self {
            outcome: Err(message.to_string()),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl PriceLookup for RecordingLookup {
    async fn lookup_price(&self, symbol: &str) -> Result<f64> {
        self.calls.lock().unwrap().push(symbol.to_string());
        self.outcome.clone().map_err(|msg| anyhow::anyhow!(msg))
    }
}
