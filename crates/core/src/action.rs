//! Action trait and registry: the vocabulary the model can act with.
//!
//! Each action (list_files, write_file, terraform_apply, ...) implements
//! [`Action`] and declares an [`ActionDescriptor`]: its name, an ordered
//! parameter schema and a side-effect class. The [`ActionRegistry`] is
//! built once per run and is the single source for both the definitions
//! advertised to the model and the executor's dispatch table.

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::error::ActionError;
use crate::path::PathContext;
use crate::provider::ActionDefinition;

/// JSON arguments after protocol parsing.
pub type Arguments = serde_json::Map<String, serde_json::Value>;

/// How much an action can change the world.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SideEffect {
    ReadOnly,
    Mutating,
    Destructive,
}

impl SideEffect {
    /// Mutating and destructive actions must be approved before running.
    pub fn requires_confirmation(&self) -> bool {
        !matches!(self, SideEffect::ReadOnly)
    }
}

impl std::fmt::Display for SideEffect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SideEffect::ReadOnly => write!(f, "read-only"),
            SideEffect::Mutating => write!(f, "mutating"),
            SideEffect::Destructive => write!(f, "destructive"),
        }
    }
}

/// The type of a single parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParamType {
    String,
    Integer,
    Boolean,
    StringList,
}

impl ParamType {
    fn matches(&self, value: &serde_json::Value) -> bool {
        match self {
            ParamType::String => value.is_string(),
            ParamType::Integer => value.is_i64() || value.is_u64(),
            ParamType::Boolean => value.is_boolean(),
            ParamType::StringList => value
                .as_array()
                .is_some_and(|items| items.iter().all(|v| v.is_string())),
        }
    }

    fn json_schema(&self) -> serde_json::Value {
        match self {
            ParamType::String => serde_json::json!({ "type": "string" }),
            ParamType::Integer => serde_json::json!({ "type": "integer" }),
            ParamType::Boolean => serde_json::json!({ "type": "boolean" }),
            ParamType::StringList => {
                serde_json::json!({ "type": "array", "items": { "type": "string" } })
            }
        }
    }
}

impl std::fmt::Display for ParamType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ParamType::String => write!(f, "string"),
            ParamType::Integer => write!(f, "integer"),
            ParamType::Boolean => write!(f, "boolean"),
            ParamType::StringList => write!(f, "list of strings"),
        }
    }
}

/// One named, typed parameter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParamSpec {
    pub name: String,
    pub kind: ParamType,
    pub description: String,
    pub required: bool,
}

/// An ordered set of parameters.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ParamSchema {
    pub fields: Vec<ParamSpec>,
}

impl ParamSchema {
    pub fn field(&self, name: &str) -> Option<&ParamSpec> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Check supplied arguments. Unknown fields, missing required fields
    /// and type mismatches are all rejected; nothing is coerced.
    pub fn validate(&self, action: &str, arguments: &Arguments) -> Result<(), ActionError> {
        let invalid = |reason: String| ActionError::InvalidArguments {
            action: action.to_string(),
            reason,
        };

        for key in arguments.keys() {
            if self.field(key).is_none() {
                return Err(invalid(format!("unrecognized field '{key}'")));
            }
        }

        for field in &self.fields {
            match arguments.get(&field.name) {
                None | Some(serde_json::Value::Null) => {
                    if field.required {
                        return Err(invalid(format!("missing required field '{}'", field.name)));
                    }
                }
                Some(value) if !field.kind.matches(value) => {
                    return Err(invalid(format!(
                        "field '{}' must be a {}",
                        field.name, field.kind
                    )));
                }
                Some(_) => {}
            }
        }

        Ok(())
    }

    /// JSON Schema object sent to the model.
    pub fn to_json_schema(&self) -> serde_json::Value {
        let mut properties = serde_json::Map::new();
        for field in &self.fields {
            let mut schema = field.kind.json_schema();
            schema["description"] = serde_json::Value::String(field.description.clone());
            properties.insert(field.name.clone(), schema);
        }
        let required: Vec<&str> = self
            .fields
            .iter()
            .filter(|f| f.required)
            .map(|f| f.name.as_str())
            .collect();

        serde_json::json!({
            "type": "object",
            "properties": properties,
            "required": required,
            "additionalProperties": false,
        })
    }
}

/// Everything the registry knows about an action besides its code.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionDescriptor {
    pub name: String,
    pub description: String,
    pub schema: ParamSchema,
    pub side_effect: SideEffect,
}

impl ActionDescriptor {
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        side_effect: SideEffect,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            schema: ParamSchema::default(),
            side_effect,
        }
    }

    /// Add a required parameter.
    pub fn required(mut self, name: &str, kind: ParamType, description: &str) -> Self {
        self.schema.fields.push(ParamSpec {
            name: name.into(),
            kind,
            description: description.into(),
            required: true,
        });
        self
    }

    /// Add an optional parameter.
    pub fn optional(mut self, name: &str, kind: ParamType, description: &str) -> Self {
        self.schema.fields.push(ParamSpec {
            name: name.into(),
            kind,
            description: description.into(),
            required: false,
        });
        self
    }

    /// Convert into the definition advertised to the model.
    pub fn to_definition(&self) -> ActionDefinition {
        ActionDefinition {
            name: self.name.clone(),
            description: self.description.clone(),
            parameters: self.schema.to_json_schema(),
        }
    }
}

/// What a successful action produced.
#[derive(Debug, Clone, PartialEq)]
pub enum ActionOutput {
    Text(String),
    /// Structured listing, rendered one entry per line
    Lines(Vec<String>),
}

impl ActionOutput {
    pub fn render(&self) -> String {
        match self {
            ActionOutput::Text(text) => text.clone(),
            ActionOutput::Lines(lines) => lines.join("\n"),
        }
    }
}

/// Deserialize validated arguments into an action's typed argument struct.
pub fn parse_args<T: DeserializeOwned>(action: &str, arguments: Arguments) -> Result<T, ActionError> {
    serde_json::from_value(serde_json::Value::Object(arguments)).map_err(|e| {
        ActionError::InvalidArguments {
            action: action.to_string(),
            reason: e.to_string(),
        }
    })
}

/// The core Action trait.
///
/// Implementations receive arguments that already passed schema
/// validation, plus the run's path context for anything filesystem-bound.
#[async_trait]
pub trait Action: Send + Sync {
    fn descriptor(&self) -> &ActionDescriptor;

    async fn execute(
        &self,
        arguments: Arguments,
        ctx: &mut PathContext,
    ) -> Result<ActionOutput, ActionError>;

    fn name(&self) -> &str {
        &self.descriptor().name
    }
}

/// Builder for an [`ActionRegistry`]. Registration order is preserved.
#[derive(Default)]
pub struct ActionRegistryBuilder {
    actions: Vec<Box<dyn Action>>,
    index: HashMap<String, usize>,
}

impl ActionRegistryBuilder {
    /// Register an action. Fails if the name is already taken.
    pub fn register(mut self, action: impl Action + 'static) -> Result<Self, ActionError> {
        self.register_boxed(Box::new(action))?;
        Ok(self)
    }

    pub fn register_boxed(&mut self, action: Box<dyn Action>) -> Result<(), ActionError> {
        let name = action.name().to_string();
        if self.index.contains_key(&name) {
            return Err(ActionError::DuplicateAction(name));
        }
        self.index.insert(name, self.actions.len());
        self.actions.push(action);
        Ok(())
    }

    pub fn build(self) -> ActionRegistry {
        ActionRegistry {
            actions: self.actions,
            index: self.index,
        }
    }
}

/// An immutable registry of available actions.
pub struct ActionRegistry {
    actions: Vec<Box<dyn Action>>,
    index: HashMap<String, usize>,
}

impl ActionRegistry {
    pub fn builder() -> ActionRegistryBuilder {
        ActionRegistryBuilder::default()
    }

    /// Look up an action by name.
    pub fn get(&self, name: &str) -> Result<&dyn Action, ActionError> {
        self.index
            .get(name)
            .map(|&i| self.actions[i].as_ref())
            .ok_or_else(|| ActionError::UnknownAction(name.to_string()))
    }

    pub fn descriptor(&self, name: &str) -> Result<&ActionDescriptor, ActionError> {
        self.get(name).map(|a| a.descriptor())
    }

    /// The declared parameter schema of an action.
    pub fn schema_for(&self, name: &str) -> Result<&ParamSchema, ActionError> {
        self.descriptor(name).map(|d| &d.schema)
    }

    /// Definitions for the model, in registration order.
    pub fn definitions(&self) -> Vec<ActionDefinition> {
        self.descriptors().map(|d| d.to_definition()).collect()
    }

    pub fn descriptors(&self) -> impl Iterator<Item = &ActionDescriptor> {
        self.actions.iter().map(|a| a.descriptor())
    }

    pub fn names(&self) -> Vec<&str> {
        self.actions.iter().map(|a| a.name()).collect()
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// A simple test action for unit tests.
    struct EchoAction {
        descriptor: ActionDescriptor,
    }

    impl EchoAction {
        fn new() -> Self {
            Self {
                descriptor: ActionDescriptor::new("echo", "Echoes back the input", SideEffect::ReadOnly)
                    .required("text", ParamType::String, "Text to echo")
                    .optional("times", ParamType::Integer, "Repeat count"),
            }
        }
    }

    #[derive(Deserialize)]
    struct EchoArgs {
        text: String,
        times: Option<usize>,
    }

    #[async_trait]
    impl Action for EchoAction {
        fn descriptor(&self) -> &ActionDescriptor {
            &self.descriptor
        }

        async fn execute(
            &self,
            arguments: Arguments,
            _ctx: &mut PathContext,
        ) -> Result<ActionOutput, ActionError> {
            let args: EchoArgs = parse_args(self.name(), arguments)?;
            Ok(ActionOutput::Lines(vec![args.text; args.times.unwrap_or(1)]))
        }
    }

    fn args(value: serde_json::Value) -> Arguments {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn registry_register_and_lookup() {
        let registry = ActionRegistry::builder().register(EchoAction::new()).unwrap().build();
        assert!(registry.get("echo").is_ok());
        assert!(matches!(registry.get("nonexistent"), Err(ActionError::UnknownAction(_))));
        assert_eq!(registry.schema_for("echo").unwrap().fields.len(), 2);
        assert!(registry.schema_for("nonexistent").is_err());
    }

    #[test]
    fn duplicate_registration_fails() {
        let err = ActionRegistry::builder()
            .register(EchoAction::new())
            .unwrap()
            .register(EchoAction::new())
            .err()
            .unwrap();
        assert!(matches!(err, ActionError::DuplicateAction(name) if name == "echo"));
    }

    #[test]
    fn registry_definitions() {
        let registry = ActionRegistry::builder().register(EchoAction::new()).unwrap().build();
        let defs = registry.definitions();
        assert_eq!(defs.len(), 1);
        assert_eq!(defs[0].name, "echo");
        assert_eq!(defs[0].parameters["required"], serde_json::json!(["text"]));
        assert_eq!(defs[0].parameters["additionalProperties"], serde_json::json!(false));
        assert_eq!(defs[0].parameters["properties"]["times"]["type"], "integer");
    }

    #[test]
    fn validation_rejects_missing_unknown_and_mistyped() {
        let schema = EchoAction::new().descriptor.schema;

        assert!(schema.validate("echo", &args(serde_json::json!({"text": "hi"}))).is_ok());

        let err = schema.validate("echo", &args(serde_json::json!({}))).unwrap_err();
        assert!(err.to_string().contains("missing required field 'text'"));

        let err = schema
            .validate("echo", &args(serde_json::json!({"text": "hi", "loud": true})))
            .unwrap_err();
        assert!(err.to_string().contains("unrecognized field 'loud'"));

        let err = schema
            .validate("echo", &args(serde_json::json!({"text": 42})))
            .unwrap_err();
        assert!(err.to_string().contains("must be a string"));

        // No coercion from string to integer
        assert!(schema
            .validate("echo", &args(serde_json::json!({"text": "hi", "times": "2"})))
            .is_err());
    }

    #[test]
    fn string_list_type() {
        assert!(ParamType::StringList.matches(&serde_json::json!(["a", "b"])));
        assert!(ParamType::StringList.matches(&serde_json::json!([])));
        assert!(!ParamType::StringList.matches(&serde_json::json!(["a", 1])));
        assert!(!ParamType::StringList.matches(&serde_json::json!("a")));
    }

    #[tokio::test]
    async fn execute_with_typed_arguments() {
        let registry = ActionRegistry::builder().register(EchoAction::new()).unwrap().build();
        let mut ctx = PathContext::new(".");
        let output = registry
            .get("echo")
            .unwrap()
            .execute(args(serde_json::json!({"text": "hello", "times": 2})), &mut ctx)
            .await
            .unwrap();
        assert_eq!(output.render(), "hello\nhello");
    }

    #[test]
    fn side_effect_confirmation_policy() {
        assert!(!SideEffect::ReadOnly.requires_confirmation());
        assert!(SideEffect::Mutating.requires_confirmation());
        assert!(SideEffect::Destructive.requires_confirmation());
    }
}
