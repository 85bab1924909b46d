//! Skill descriptor types parsed from `skill.yaml`.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use serde_json::json;

/// Runtime a skill executes under.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SkillRuntime {
    Python,
    Node,
    Go,
    Binary,
}

/// Parameter value types accepted in a skill descriptor.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParamType {
    String,
    Integer,
    Number,
    Boolean,
}

impl ParamType {
    fn json_type(&self) -> &'static str {
        match self {
            ParamType::String => "string",
            ParamType::Integer => "integer",
            ParamType::Number => "number",
            ParamType::Boolean => "boolean",
        }
    }
}

/// One declared parameter.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SkillParam {
    pub name: String,
    #[serde(rename = "type")]
    pub param_type: ParamType,
    #[serde(default)]
    pub required: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
}

/// Optional usage docs.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SkillDocs {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub when_to_use: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub when_not_to_use: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub examples: Vec<String>,
}

/// Parsed skill descriptor. `dir` is populated by the loader, not the file.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SkillDef {
    pub name: String,
    pub description: String,
    pub runtime: SkillRuntime,
    pub entry: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub parameters: Vec<SkillParam>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub docs: Option<SkillDocs>,
    #[serde(skip)]
    pub dir: PathBuf,
}

impl SkillDef {
    /// JSON schema for the arguments object, derived from the declared
    /// parameters.
    pub fn input_schema(&self) -> serde_json::Value {
        let mut properties = serde_json::Map::new();
        let mut required = Vec::new();
        for param in &self.parameters {
            let mut prop = serde_json::Map::new();
            prop.insert("type".to_string(), json!(param.param_type.json_type()));
            if !param.description.is_empty() {
                prop.insert("description".to_string(), json!(param.description));
            }
            if let Some(default) = &param.default {
                prop.insert("default".to_string(), default.clone());
            }
            properties.insert(param.name.clone(), serde_json::Value::Object(prop));
            if param.required {
                required.push(json!(param.name));
            }
        }
        let mut schema = serde_json::Map::new();
        schema.insert("type".to_string(), json!("object"));
        schema.insert("properties".to_string(), serde_json::Value::Object(properties));
        if !required.is_empty() {
            schema.insert("required".to_string(), serde_json::Value::Array(required));
        }
        serde_json::Value::Object(schema)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Round-trip: parse, render, re-parse yields an equal descriptor
    /// (modulo the loader-populated directory).
    #[test]
    fn skill_yaml_round_trip() {
        let yaml = r#"
name: greet_run
description: Greets the caller
runtime: python
entry: main.py
parameters:
  - name: msg
    type: string
    required: true
    description: message to echo
  - name: times
    type: integer
    default: 1
docs:
  when_to_use: greetings
  examples:
    - greet the user
"#;
        let parsed: SkillDef = serde_yaml::from_str(yaml).unwrap();
        let rendered = serde_yaml::to_string(&parsed).unwrap();
        let reparsed: SkillDef = serde_yaml::from_str(&rendered).unwrap();
        assert_eq!(parsed, reparsed);
        assert_eq!(parsed.runtime, SkillRuntime::Python);
        assert_eq!(parsed.parameters.len(), 2);
    }

    #[test]
    fn unknown_runtime_is_a_parse_error() {
        let yaml = "name: x\ndescription: d\nruntime: ruby\nentry: main.rb";
        assert!(serde_yaml::from_str::<SkillDef>(yaml).is_err());
    }

    #[test]
    fn input_schema_lists_required_params() {
        let def: SkillDef = serde_yaml::from_str(
            "name: x\ndescription: d\nruntime: binary\nentry: run\nparameters:\n  - name: msg\n    type: string\n    required: true\n  - name: count\n    type: integer\n",
        )
        .unwrap();
        let schema = def.input_schema();
        assert_eq!(schema["type"], "object");
        assert_eq!(schema["properties"]["msg"]["type"], "string");
        assert_eq!(schema["properties"]["count"]["type"], "integer");
        assert_eq!(schema["required"], serde_json::json!(["msg"]));
    }

    #[test]
    fn input_schema_without_params_is_empty_object_schema() {
        let def: SkillDef =
            serde_yaml::from_str("name: x\ndescription: d\nruntime: binary\nentry: run").unwrap();
        let schema = def.input_schema();
        assert_eq!(schema["type"], "object");
        assert!(schema["properties"].as_object().unwrap().is_empty());
        assert!(schema.get("required").is_none());
    }
}
