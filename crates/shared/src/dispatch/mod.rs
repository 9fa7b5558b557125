//! Routes a parsed function call to its capability.
//!
//! Every failure along the way (unknown name, bad payload, missing argument,
//! failed lookup) is logged and turned into an empty [`CapabilityResult`].
//! [`Dispatcher::try_dispatch`] exposes the typed error for callers that care.

use serde_json::{Map, Value};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::registry::{CapabilityRegistry, RoutingMode};
use crate::schemas::{CallDescriptor, CapabilityResult, ToolSchema};

#[derive(Debug, Error, PartialEq)]
pub enum DispatchError {
    #[error("unsupported capability: {0}")]
    UnsupportedCapability(String),
    #[error("no arguments/parameters key found in function call")]
    MissingPayload,
    #[error("error decoding function call arguments: {0}")]
    MalformedArguments(String),
    #[error("{0} not found in function call arguments/parameters")]
    MissingArgument(&'static str),
    #[error("{name} must be a {expected}")]
    InvalidArgument {
        name: &'static str,
        expected: &'static str,
    },
    #[error("{capability} failed: {message}")]
    Invocation { capability: String, message: String },
}

pub struct Dispatcher {
    registry: CapabilityRegistry,
    routing: RoutingMode,
}

impl Dispatcher {
    pub fn new(registry: CapabilityRegistry, routing: RoutingMode) -> Self {
        Self { registry, routing }
    }

    pub fn routing(&self) -> RoutingMode {
        self.routing
    }

    /// Runs the call, reporting why it produced nothing.
    pub async fn try_dispatch(
        &self,
        call: &CallDescriptor,
    ) -> Result<CapabilityResult, DispatchError> {
        let capability = self
            .registry
            .get(&call.name)
            .ok_or_else(|| DispatchError::UnsupportedCapability(call.name.clone()))?;

        let args = normalize_arguments(call.payload())?;
        validate_arguments(capability.schema(), &args)?;

        capability
            .invoke(&args)
            .await
            .map_err(|e| DispatchError::Invocation {
                capability: call.name.clone(),
                message: format!("{:#}", e),
            })
    }

    /// Runs the call. Never fails; problems are logged and yield an empty result.
    pub async fn dispatch(&self, call: &CallDescriptor) -> CapabilityResult {
        match self.try_dispatch(call).await {
            Ok(result) => {
                info!(capability = %call.name, result = %result.to_json(), "capability returned");
                result
            }
            Err(DispatchError::UnsupportedCapability(name)) => {
                match self.routing {
                    RoutingMode::Strict => warn!(
                        capability = %name,
                        registered = ?self.registry.names(),
                        "unsupported capability requested"
                    ),
                    RoutingMode::Lenient => debug!(capability = %name, "ignoring unsupported capability"),
                }
                CapabilityResult::empty()
            }
            Err(e) => {
                warn!(capability = %call.name, error = %e, "capability call produced no result");
                CapabilityResult::empty()
            }
        }
    }
}

/// Turns the call payload into an argument map.
///
/// Accepts a JSON object, or a string holding one.
pub fn normalize_arguments(payload: Option<&Value>) -> Result<Map<String, Value>, DispatchError> {
    let payload = payload.ok_or(DispatchError::MissingPayload)?;

    let decoded;
    let value = match payload {
        Value::String(encoded) => {
            decoded = serde_json::from_str::<Value>(encoded)
                .map_err(|e| DispatchError::MalformedArguments(e.to_string()))?;
            &decoded
        }
        other => other,
    };

    match value {
        Value::Object(map) => Ok(map.clone()),
        other => Err(DispatchError::MalformedArguments(format!(
            "expected a JSON object, got {}",
            json_kind(other)
        ))),
    }
}

/// Checks required parameters are present and non-empty.
pub fn validate_arguments(
    schema: &ToolSchema,
    args: &Map<String, Value>,
) -> Result<(), DispatchError> {
    for param in schema.required_parameters() {
        match args.get(param.name) {
            None | Some(Value::Null) => return Err(DispatchError::MissingArgument(param.name)),
            Some(Value::String(s)) if s.is_empty() => {
                return Err(DispatchError::MissingArgument(param.name));
            }
            Some(Value::String(_)) => {}
            Some(_) if param.type_name == "string" => {
                return Err(DispatchError::InvalidArgument {
                    name: param.name,
                    expected: param.type_name,
                });
            }
            Some(_) => {}
        }
    }
    Ok(())
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
