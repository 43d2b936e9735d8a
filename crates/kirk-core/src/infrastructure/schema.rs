//! JSON schema of the project files

use std::sync::LazyLock;

use jsonschema::Validator;
use serde_json::{
    json,
    Value,
};

use crate::{
    KirkError,
    KirkResult,
};

static PROJECT_VALIDATOR: LazyLock<Validator> = LazyLock::new(|| {
    jsonschema::validator_for(&project_schema()).expect("Invalid project schema")
});

pub fn project_schema() -> Value {
    json!({
        "$schema": "http://json-schema.org/draft-07/schema#",
        "title": "kirk project",
        "type": "object",
        "required": [
            "name",
            "description",
            "author",
            "year",
            "version",
            "location",
            "defaults",
            "jobs"
        ],
        "properties": {
            "name": { "type": "string", "minLength": 1 },
            "description": { "type": "string" },
            "author": { "type": "string" },
            "year": { "type": "integer" },
            "version": { "type": ["number", "string"] },
            "location": { "type": "string", "minLength": 1 },
            "defaults": {
                "type": "object",
                "required": ["server"],
                "properties": {
                    "server": { "type": "string", "minLength": 1 },
                    "scm": { "$ref": "#/definitions/scm" },
                    "parameters": { "$ref": "#/definitions/parameters" }
                }
            },
            "jobs": {
                "type": "array",
                "minItems": 1,
                "items": {
                    "type": "object",
                    "required": ["name"],
                    "properties": {
                        "name": { "type": "string", "minLength": 1 },
                        "pipeline": { "type": "string" },
                        "server": { "type": "string", "minLength": 1 },
                        "scm": { "$ref": "#/definitions/scm" },
                        "parameters": { "$ref": "#/definitions/parameters" },
                        "depends": {
                            "type": "array",
                            "items": { "type": "string" }
                        }
                    }
                }
            }
        },
        "definitions": {
            "scm": {
                "type": "object",
                "properties": {
                    "git": {
                        "type": "object",
                        "required": ["url"],
                        "properties": {
                            "url": { "type": "string" },
                            "checkout": { "type": "string" },
                            "credential": { "type": "string" }
                        }
                    },
                    "perforce": {
                        "type": "object",
                        "required": ["stream", "workspace", "credential"],
                        "properties": {
                            "stream": { "type": "string" },
                            "workspace": { "type": "string" },
                            "credential": { "type": "string" },
                            "changelist": { "type": ["string", "integer"] }
                        }
                    },
                    "none": {
                        "type": "object",
                        "required": ["script"],
                        "properties": {
                            "script": { "type": "string" },
                            "sandbox": { "type": "boolean" }
                        }
                    }
                }
            },
            "parameters": {
                "type": "array",
                "items": {
                    "type": "object",
                    "required": ["name", "label"],
                    "properties": {
                        "name": { "type": "string", "minLength": 1 },
                        "label": { "type": "string" },
                        "default": { "type": ["string", "number", "boolean", "null"] },
                        "show": { "type": "boolean" }
                    }
                }
            }
        }
    })
}

/// Validates a loaded project document.
///
/// Every violation is reported in the returned error message.
pub fn validate_project(document: &serde_yaml::Value) -> KirkResult<()> {
    let instance = serde_json::to_value(document)
        .map_err(|e| KirkError::Validation(format!("Unsupported YAML content: {e}")))?;

    let errors: Vec<String> = PROJECT_VALIDATOR
        .iter_errors(&instance)
        .map(|error| error.to_string())
        .collect();

    if errors.is_empty() {
        Ok(())
    } else {
        Err(KirkError::Validation(errors.join("; ")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn document(yaml: &str) -> serde_yaml::Value {
        serde_yaml::from_str(yaml).unwrap()
    }

    const VALID: &str = r#"
name: project
description: my project
author: pippo
year: 3010
version: 1.0
location: myProject
defaults:
    server: myserver.com
jobs:
    - name: Test_mytest
      pipeline: pipeline.groovy
"#;

    #[test]
    fn test_valid_document() {
        validate_project(&document(VALID)).unwrap();
    }

    #[test]
    fn test_missing_defaults() {
        let yaml = VALID.replace("defaults:\n    server: myserver.com\n", "");
        let err = validate_project(&document(&yaml)).unwrap_err();
        assert!(matches!(err, KirkError::Validation(ref m) if m.contains("defaults")));
    }

    #[test]
    fn test_missing_jobs() {
        let yaml = VALID.replace(
            "jobs:\n    - name: Test_mytest\n      pipeline: pipeline.groovy\n",
            "",
        );
        let err = validate_project(&document(&yaml)).unwrap_err();
        assert!(matches!(err, KirkError::Validation(ref m) if m.contains("jobs")));
    }

    #[test]
    fn test_parameter_requires_label() {
        let yaml = format!(
            "{VALID}      parameters:\n        - name: MY_PARAM\n          default: ABC\n"
        );
        let err = validate_project(&document(&yaml)).unwrap_err();
        assert!(matches!(err, KirkError::Validation(ref m) if m.contains("label")));
    }

    #[test]
    fn test_git_requires_url() {
        let yaml = VALID.replace(
            "    server: myserver.com\n",
            "    server: myserver.com\n    scm:\n        git:\n            checkout: master\n",
        );
        let err = validate_project(&document(&yaml)).unwrap_err();
        assert!(matches!(err, KirkError::Validation(ref m) if m.contains("url")));
    }
}
