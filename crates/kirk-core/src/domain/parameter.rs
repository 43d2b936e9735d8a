use std::fmt;

/// A named job parameter
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Parameter {
    name: String,
    label: String,
    default: String,
    value: String,
    show: bool,
}

impl Parameter {
    pub fn new(
        name: impl Into<String>, label: impl Into<String>, default: impl Into<String>, show: bool,
    ) -> Self {
        let default = default.into();
        Self {
            name: name.into(),
            label: label.into(),
            value: default.clone(),
            default,
            show,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn default_value(&self) -> &str {
        &self.default
    }

    /// Current value, initialized with the default one
    pub fn value(&self) -> &str {
        &self.value
    }

    /// If true, the parameter is part of the job token
    pub fn show(&self) -> bool {
        self.show
    }

    pub fn set_value(&mut self, value: impl ToString) {
        self.value = value.to_string();
    }
}

impl fmt::Display for Parameter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}", self.name, self.value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_value_starts_from_default() {
        let param = Parameter::new("JK_HELLO_MSG", "Hello message", "hello", false);
        assert_eq!(param.value(), "hello");
        assert_eq!(param.default_value(), "hello");
        assert!(!param.show());
        assert_eq!(param.to_string(), "JK_HELLO_MSG=hello");
    }

    #[test]
    fn test_set_value_stores_strings() {
        let mut param = Parameter::new("COUNT", "count", "1", true);
        param.set_value(42);
        assert_eq!(param.value(), "42");
        param.set_value(true);
        assert_eq!(param.value(), "true");
        assert_eq!(param.default_value(), "1");
    }
}
