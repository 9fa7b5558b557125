pub mod directive;
pub mod dispatch;
pub mod quotes;
pub mod registry;
pub mod schemas;
pub mod toolbelts;

#[cfg(test)]
mod test_support;

pub use directive::{extract, parse_directive, DirectiveError};
pub use dispatch::{DispatchError, Dispatcher};
pub use quotes::{PriceLookup, YahooFinance};
pub use registry::{Capability, CapabilityRegistry, RoutingMode};
pub use schemas::{CallDescriptor, CapabilityResult, FunctionDefinition, ParameterSchema, ToolSchema};
