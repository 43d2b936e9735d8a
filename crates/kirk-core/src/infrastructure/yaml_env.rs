//! YAML loading with `!ENV` environment variable substitution.
//!
//! Only scalars explicitly tagged with `!ENV` are interpolated:
//!
//! ```yaml
//! server: !ENV http://${JENKINS_HOST}:8080
//! label: ${NOT_EXPANDED}
//! ```

use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;
use serde_yaml::Value;

use crate::{
    KirkError,
    KirkResult,
};

pub const ENV_TAG: &str = "!ENV";

static VAR_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\$\{(\w+)\}").expect("Invalid regex pattern"));

/// Replaces every `${NAME}` with the value of the `NAME` environment
/// variable, or with `NAME` itself when the variable is not set.
pub fn substitute(input: &str) -> String {
    VAR_PATTERN
        .replace_all(input, |caps: &regex::Captures<'_>| {
            let name = &caps[1];
            std::env::var(name).unwrap_or_else(|_| name.to_string())
        })
        .into_owned()
}

pub fn load(path: &Path) -> KirkResult<Value> {
    load_with_tag(path, ENV_TAG)
}

pub fn load_with_tag(path: &Path, tag: &str) -> KirkResult<Value> {
    if path.as_os_str().is_empty() {
        return Err(KirkError::invalid_argument("path is empty"));
    }

    if tag.is_empty() {
        return Err(KirkError::invalid_argument("tag is empty"));
    }

    if !path.is_file() {
        return Err(KirkError::InvalidArgument(format!(
            "'{}' file doesn't exist",
            path.display()
        )));
    }

    check_extension(path)?;

    let content = std::fs::read_to_string(path).map_err(|e| KirkError::io(path, e))?;
    parse_with_tag(&content, tag)
}

pub fn parse(content: &str) -> KirkResult<Value> {
    parse_with_tag(content, ENV_TAG)
}

pub fn parse_with_tag(content: &str, tag: &str) -> KirkResult<Value> {
    let mut value: Value = serde_yaml::from_str(content)
        .map_err(|e| KirkError::Validation(format!("Failed to parse YAML: {e}")))?;

    resolve_tags(&mut value, tag);
    Ok(value)
}

/// Rejects anything but `.yml` and `.yaml` files
pub fn check_extension(path: &Path) -> KirkResult<()> {
    match path.extension().and_then(|ext| ext.to_str()) {
        Some("yml") | Some("yaml") => Ok(()),
        Some(ext) => Err(KirkError::Validation(format!(
            "'.{ext}' file type is not supported"
        ))),
        None => Err(KirkError::Validation(
            "'' file type is not supported".to_string(),
        )),
    }
}

pub fn is_project_file(path: &Path) -> bool {
    check_extension(path).is_ok()
}

fn resolve_tags(value: &mut Value, tag: &str) {
    match value {
        Value::Tagged(tagged) if tagged.tag == tag => {
            let resolved = match &tagged.value {
                Value::String(s) => Some(Value::String(substitute(s))),
                Value::Number(n) => Some(Value::String(substitute(&n.to_string()))),
                Value::Bool(b) => Some(Value::String(b.to_string())),
                _ => None,
            };

            match resolved {
                Some(resolved) => *value = resolved,
                None => {
                    let mut inner = std::mem::take(&mut tagged.value);
                    resolve_tags(&mut inner, tag);
                    *value = inner;
                }
            }
        }
        Value::Tagged(tagged) => resolve_tags(&mut tagged.value, tag),
        Value::Sequence(items) => {
            for item in items {
                resolve_tags(item, tag);
            }
        }
        Value::Mapping(mapping) => {
            for (_, item) in mapping.iter_mut() {
                resolve_tags(item, tag);
            }
        }
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_substitute() {
        std::env::set_var("KIRK_TEST_SUBST_HOST", "jenkins.local");
        assert_eq!(
            substitute("http://${KIRK_TEST_SUBST_HOST}:8080"),
            "http://jenkins.local:8080"
        );
        std::env::remove_var("KIRK_TEST_SUBST_HOST");
    }

    #[test]
    fn test_substitute_unset_falls_back_to_name() {
        assert_eq!(
            substitute("${KIRK_TEST_UNSET_VARIABLE_987}"),
            "KIRK_TEST_UNSET_VARIABLE_987"
        );
    }

    #[test]
    fn test_load_tagged_scalar() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("myfile.yml");
        std::fs::write(&file, "name: !ENV ${__KIRK_MY_VAR__}\n").unwrap();
        std::env::set_var("__KIRK_MY_VAR__", "hello");

        let value = load(&file).unwrap();
        assert_eq!(value["name"].as_str(), Some("hello"));

        std::env::remove_var("__KIRK_MY_VAR__");
    }

    #[test]
    fn test_untagged_scalar_is_verbatim() {
        std::env::set_var("__KIRK_UNTAGGED_VAR__", "hello");
        let value = parse("name: ${__KIRK_UNTAGGED_VAR__}\n").unwrap();
        assert_eq!(value["name"].as_str(), Some("${__KIRK_UNTAGGED_VAR__}"));
        std::env::remove_var("__KIRK_UNTAGGED_VAR__");
    }

    #[test]
    fn test_invalid_definition() {
        std::env::set_var("__KIRK_INVALID_VAR__", "hello");
        let value = parse(
            "name0: !ENV ${__KIRK_INVALID_VAR__\nname1: !ENV __KIRK_INVALID_VAR__\n",
        )
        .unwrap();

        assert_eq!(value["name0"].as_str(), Some("${__KIRK_INVALID_VAR__"));
        assert_eq!(value["name1"].as_str(), Some("__KIRK_INVALID_VAR__"));
        std::env::remove_var("__KIRK_INVALID_VAR__");
    }

    #[test]
    fn test_nested_values() {
        std::env::set_var("__KIRK_NESTED_VAR__", "abc");
        let value = parse(
            "jobs:\n  - name: job\n    parameters:\n      - default: !ENV pre-${__KIRK_NESTED_VAR__}\n",
        )
        .unwrap();

        assert_eq!(
            value["jobs"][0]["parameters"][0]["default"].as_str(),
            Some("pre-abc")
        );
        std::env::remove_var("__KIRK_NESTED_VAR__");
    }

    #[test]
    fn test_load_invalid_args() {
        let dir = tempfile::tempdir().unwrap();

        assert!(matches!(
            load(Path::new("")),
            Err(KirkError::InvalidArgument(_))
        ));
        assert!(matches!(
            load_with_tag(Path::new("file.yml"), ""),
            Err(KirkError::InvalidArgument(_))
        ));
        assert!(matches!(
            load(&dir.path().join("file.yml")),
            Err(KirkError::InvalidArgument(_))
        ));

        let text = dir.path().join("myfile.txt");
        std::fs::write(&text, "abc").unwrap();
        let err = load(&text).unwrap_err();
        assert!(matches!(err, KirkError::Validation(ref m) if m == "'.txt' file type is not supported"));
    }
}
