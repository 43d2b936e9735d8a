use std::collections::BTreeSet;
use std::sync::LazyLock;

use indexmap::IndexMap;
use regex::Regex;

use crate::{
    KirkError,
    KirkResult,
};

static PLACEHOLDER_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"KIRK_\w+").expect("Invalid regex pattern"));

/// An XML document with `KIRK_<NAME>` placeholders.
///
/// The placeholder set is declared next to the source and checked against
/// it when the template is created.
#[derive(Debug, Clone)]
pub struct FlowTemplate {
    source: &'static str,
    placeholders: &'static [&'static str],
}

impl FlowTemplate {
    pub fn new(source: &'static str, placeholders: &'static [&'static str]) -> KirkResult<Self> {
        let declared: BTreeSet<&str> = placeholders.iter().copied().collect();
        let found = scan_placeholders(source);

        if declared != found {
            let missing: Vec<&str> = found.difference(&declared).copied().collect();
            let unused: Vec<&str> = declared.difference(&found).copied().collect();
            return Err(KirkError::Template(format!(
                "Placeholders out of sync: undeclared {:?}, unused {:?}",
                missing, unused
            )));
        }

        Ok(Self {
            source,
            placeholders,
        })
    }

    pub fn placeholders(&self) -> &[&'static str] {
        self.placeholders
    }

    /// Replaces every placeholder in a single pass.
    ///
    /// Substituted text is never scanned again.
    pub fn render(&self, values: &IndexMap<&'static str, String>) -> KirkResult<String> {
        if let Some(missing) = self
            .placeholders
            .iter()
            .find(|name| !values.contains_key(**name))
        {
            return Err(KirkError::Template(format!(
                "No value for placeholder '{missing}'"
            )));
        }

        if let Some(extra) = values
            .keys()
            .find(|name| !self.placeholders.contains(*name))
        {
            return Err(KirkError::Template(format!(
                "Value for unknown placeholder '{extra}'"
            )));
        }

        let rendered = PLACEHOLDER_PATTERN.replace_all(self.source, |caps: &regex::Captures<'_>| {
            values.get(&caps[0]).cloned().unwrap_or_default()
        });

        Ok(rendered.into_owned())
    }
}

fn scan_placeholders(source: &str) -> BTreeSet<&str> {
    PLACEHOLDER_PATTERN
        .find_iter(source)
        .map(|m| m.as_str())
        .collect()
}
