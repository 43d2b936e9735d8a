use std::fmt;

use indexmap::IndexMap;
use serde::{
    Deserialize,
    Deserializer,
};

/// Source control configuration of a job.
///
/// Only one of the known sections is expected; any other key is kept so
/// that the workflow builder can report it.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ScmConfig {
    #[serde(default)]
    pub git: Option<GitScm>,

    #[serde(default)]
    pub perforce: Option<PerforceScm>,

    #[serde(default, rename = "none")]
    pub script: Option<ScriptScm>,

    #[serde(flatten)]
    pub other: IndexMap<String, serde_yaml::Value>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct GitScm {
    pub url: String,
    #[serde(default)]
    pub checkout: Option<String>,
    #[serde(default)]
    pub credential: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PerforceScm {
    pub stream: String,
    pub workspace: String,
    pub credential: String,
    #[serde(default, deserialize_with = "optional_scalar")]
    pub changelist: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ScriptScm {
    pub script: String,
    #[serde(default)]
    pub sandbox: bool,
}

impl ScmConfig {
    pub fn git(url: impl Into<String>) -> Self {
        Self {
            git: Some(GitScm {
                url: url.into(),
                checkout: None,
                credential: None,
            }),
            ..Self::default()
        }
    }

    /// Names of the sections present in the configuration
    pub fn kinds(&self) -> Vec<&str> {
        let mut kinds = Vec::new();
        if self.git.is_some() {
            kinds.push("git");
        }
        if self.perforce.is_some() {
            kinds.push("perforce");
        }
        if self.script.is_some() {
            kinds.push("none");
        }
        kinds.extend(self.other.keys().map(String::as_str));
        kinds
    }
}

impl fmt::Display for ScmConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kinds = self.kinds();
        if kinds.is_empty() {
            write!(f, "<empty>")
        } else {
            write!(f, "{}", kinds.join(", "))
        }
    }
}

/// Reads any YAML scalar as its string form; null becomes an empty string.
pub(crate) fn scalar_to_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_yaml::Value::deserialize(deserializer)?;
    scalar_value(&value).map_err(serde::de::Error::custom)
}

fn optional_scalar<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_yaml::Value::deserialize(deserializer)?;
    if value.is_null() {
        return Ok(None);
    }
    scalar_value(&value)
        .map(Some)
        .map_err(serde::de::Error::custom)
}

fn scalar_value(value: &serde_yaml::Value) -> Result<String, String> {
    match value {
        serde_yaml::Value::Null => Ok(String::new()),
        serde_yaml::Value::Bool(b) => Ok(b.to_string()),
        serde_yaml::Value::Number(n) => Ok(n.to_string()),
        serde_yaml::Value::String(s) => Ok(s.clone()),
        serde_yaml::Value::Tagged(tagged) => scalar_value(&tagged.value),
        other => Err(format!("expected a scalar value, found {other:?}")),
    }
}
