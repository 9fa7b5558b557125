use std::path::Path;

use anyhow::{Context, Result};
use serde_json::{json, Value};
use tracing::info;

use quotebot_shared::CapabilityRegistry;

pub const DEFAULT_CATALOG_PATH: &str = "functions.json";

/// Function descriptions shown to the model. Passed through as-is.
#[derive(Debug, Clone, PartialEq)]
pub struct Catalog {
    entries: Vec<Value>,
}

impl Catalog {
    /// Reads a JSON array of function descriptions.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read function catalog {}", path.display()))?;
        let value: Value = serde_json::from_str(&content)
            .with_context(|| format!("function catalog {} is not valid JSON", path.display()))?;

        match value {
            Value::Array(entries) => Ok(Self { entries }),
            _ => Err(anyhow::anyhow!(
                "function catalog {} must be a JSON array",
                path.display()
            )),
        }
    }

    /// Catalog rendered from the registry's declared schemas.
    pub fn from_registry(registry: &CapabilityRegistry) -> Self {
        let entries = registry
            .definitions()
            .into_iter()
            .map(|def| {
                json!({
                    "name": def.name,
                    "description": def.description,
                    "parameters": def.parameters,
                })
            })
            .collect();

        Self { entries }
    }

    /// Explicit path, else `functions.json` if present, else the registry.
    pub fn resolve(path: Option<&Path>, registry: &CapabilityRegistry) -> Result<Self> {
        if let Some(path) = path {
            return Self::load(path);
        }

        let default = Path::new(DEFAULT_CATALOG_PATH);
        if default.exists() {
            return Self::load(default);
        }

        info!("no {} found, using built-in capability catalog", DEFAULT_CATALOG_PATH);
        Ok(Self::from_registry(registry))
    }

    pub fn names(&self) -> Vec<&str> {
        self.entries
            .iter()
            .filter_map(|e| e["name"].as_str())
            .collect()
    }

    pub fn to_json(&self) -> String {
        Value::Array(self.entries.clone()).to_string()
    }
}
