use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use serde_json::{Map, Value};

use crate::quotes::PriceLookup;
use crate::schemas::{CapabilityResult, FunctionDefinition, ToolSchema};
use crate::toolbelts::stock_quote::StockQuote;

/// Something the model can ask us to run.
///
/// `invoke` receives arguments that were already checked against `schema`.
#[async_trait]
pub trait Capability: Send + Sync {
    fn schema(&self) -> &ToolSchema;

    async fn invoke(&self, args: &Map<String, Value>) -> Result<CapabilityResult>;

    fn name(&self) -> &'static str {
        self.schema().name
    }
}

/// How loudly to report a call to a capability nobody registered.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RoutingMode {
    /// Warn about it.
    #[default]
    Strict,
    /// Only mention it at debug level.
    Lenient,
}

impl FromStr for RoutingMode {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "strict" => Ok(RoutingMode::Strict),
            "lenient" => Ok(RoutingMode::Lenient),
            other => Err(format!("unknown routing mode '{}' (expected strict or lenient)", other)),
        }
    }
}

impl fmt::Display for RoutingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RoutingMode::Strict => write!(f, "strict"),
            RoutingMode::Lenient => write!(f, "lenient"),
        }
    }
}

/// Capabilities by name, in registration order.
#[derive(Default, Clone)]
pub struct CapabilityRegistry {
    capabilities: Vec<Arc<dyn Capability>>,
}

impl CapabilityRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with every built-in capability wired to `lookup`.
    pub fn with_builtins(lookup: Arc<dyn PriceLookup>) -> Self {
        let mut registry = Self::new();
        registry.register(StockQuote::new(lookup));
        registry
    }

    /// Adds a capability, replacing any existing one with the same name.
    pub fn register(&mut self, capability: impl Capability + 'static) -> &mut Self {
        let capability: Arc<dyn Capability> = Arc::new(capability);
        match self
            .capabilities
            .iter_mut()
            .find(|c| c.name() == capability.name())
        {
            Some(existing) => *existing = capability,
            None => self.capabilities.push(capability),
        }
        self
    }

    pub fn get(&self, name: &str) -> Option<&Arc<dyn Capability>> {
        self.capabilities.iter().find(|c| c.name() == name)
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.capabilities.iter().map(|c| c.name()).collect()
    }

    /// Catalog entries for every registered capability.
    pub fn definitions(&self) -> Vec<FunctionDefinition> {
        self.capabilities
            .iter()
            .map(|c| c.schema().to_definition())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schemas::ParameterSchema;
    use crate::test_support::RecordingLookup;

    struct Echo {
        schema: ToolSchema,
    }

    impl Echo {
        fn named(name: &'static str, description: &'static str) -> Self {
            Self {
                schema: ToolSchema {
                    name,
                    description,
                    parameters: vec![ParameterSchema {
                        name: "text",
                        type_name: "string",
                        description: "Text to echo",
                        required: true,
                    }],
                },
            }
        }
    }

    #[async_trait]
    impl Capability for Echo {
        fn schema(&self) -> &ToolSchema {
            &self.schema
        }

        async fn invoke(&self, args: &Map<String, Value>) -> Result<CapabilityResult> {
            Ok(CapabilityResult::with("echo", args["text"].clone()))
        }
    }

    #[test]
    fn builtins_contain_stock_quote() {
        let registry = CapabilityRegistry::with_builtins(Arc::new(RecordingLookup::returning(1.0)));
        assert_eq!(registry.names(), vec!["get_stock_price"]);
        assert!(registry.get("get_stock_price").is_some());
        assert!(registry.get("get_weather").is_none());
    }

    #[test]
    fn register_keeps_order_and_replaces_by_name() {
        let mut registry = CapabilityRegistry::new();
        registry
            .register(Echo::named("b", "first b"))
            .register(Echo::named("a", "only a"))
            .register(Echo::named("b", "second b"));

        assert_eq!(registry.names(), vec!["b", "a"]);
        assert_eq!(registry.definitions()[0].description, "second b");
    }

    #[test]
    fn routing_mode_parses() {
        assert_eq!("strict".parse::<RoutingMode>(), Ok(RoutingMode::Strict));
        assert_eq!(" Lenient ".parse::<RoutingMode>(), Ok(RoutingMode::Lenient));
        assert!("loose".parse::<RoutingMode>().is_err());
        assert_eq!(RoutingMode::default().to_string(), "strict");
    }
}
