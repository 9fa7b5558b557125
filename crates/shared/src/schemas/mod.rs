use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

#[derive(Debug, Clone)]
pub struct ToolSchema {
    pub name: &'static str,
    pub description: &'static str,
    pub parameters: Vec<ParameterSchema>,
}

#[derive(Debug, Clone)]
pub struct ParameterSchema {
    pub name: &'static str,
    pub type_name: &'static str,
    pub description: &'static str,
    pub required: bool,
}

impl ParameterSchema {
    fn property(&self) -> Value {
        json!({ "type": self.type_name, "description": self.description })
    }
}

/// One entry of the capability catalog handed to the model.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct FunctionDefinition {
    pub name: String,
    pub description: String,
    pub parameters: Value,
}

impl ToolSchema {
    /// JSON-schema style catalog entry. Properties keep declaration order.
    pub fn to_definition(&self) -> FunctionDefinition {
        let properties: Map<String, Value> = self
            .parameters
            .iter()
            .map(|p| (p.name.to_string(), p.property()))
            .collect();
        let required: Vec<&str> = self.required_parameters().map(|p| p.name).collect();

        FunctionDefinition {
            name: self.name.to_string(),
            description: self.description.to_string(),
            parameters: json!({
                "type": "object",
                "properties": properties,
                "required": required,
            }),
        }
    }

    pub fn required_parameters(&self) -> impl Iterator<Item = &ParameterSchema> {
        self.parameters.iter().filter(|p| p.required)
    }
}

/// A function call the model asked for.
///
/// Models are inconsistent about the payload key, so both `arguments` and
/// `parameters` are kept as sent. Either may hold a JSON object or a string
/// containing one.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct CallDescriptor {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub arguments: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parameters: Option<Value>,
}

impl CallDescriptor {
    pub fn new(name: impl Into<String>, arguments: Value) -> Self {
        Self {
            name: name.into(),
            arguments: Some(arguments),
            parameters: None,
        }
    }

    /// The argument payload, preferring `arguments` over `parameters`.
    pub fn payload(&self) -> Option<&Value> {
        self.arguments.as_ref().or(self.parameters.as_ref())
    }
}

/// Output of a capability. Empty means "no usable result".
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(transparent)]
pub struct CapabilityResult(Map<String, Value>);

impl CapabilityResult {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn with(key: impl Into<String>, value: impl Into<Value>) -> Self {
        let mut map = Map::new();
        map.insert(key.into(), value.into());
        Self(map)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn to_json(&self) -> String {
        Value::Object(self.0.clone()).to_string()
    }
}
