//! Compact `project::job[key=value,...]` job identity

use std::fmt;
use std::sync::LazyLock;

use indexmap::IndexMap;
use regex::Regex;

use crate::{
    KirkError,
    KirkResult,
};

static TOKEN_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?P<project>\w+)::(?P<job>\w+)(?P<params>\[(?:\w+=\w+,?)*\])?")
        .expect("Invalid token pattern")
});

static PARAM_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\w+)=(\w+)").expect("Invalid parameter pattern"));

/// A decoded job token
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct JobToken {
    pub project: String,
    pub job: String,
    pub params: IndexMap<String, String>,
}

impl JobToken {
    pub fn new(project: impl Into<String>, job: impl Into<String>) -> Self {
        Self {
            project: project.into(),
            job: job.into(),
            params: IndexMap::new(),
        }
    }
}

impl fmt::Display for JobToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}::{}", self.project, self.job)?;
        if !self.params.is_empty() {
            write!(f, "[{}]", join_params(&self.params))?;
        }
        Ok(())
    }
}

fn join_params(params: &IndexMap<String, String>) -> String {
    params
        .iter()
        .map(|(key, value)| format!("{key}={value}"))
        .collect::<Vec<_>>()
        .join(",")
}

/// Encodes project name, job name and parameters into a token string.
///
/// Parameters keep the iteration order of `params` and the brackets are
/// omitted when there are none.
pub fn encode(project: &str, job: &str, params: &IndexMap<String, String>) -> KirkResult<String> {
    if project.is_empty() {
        return Err(KirkError::invalid_argument("project name is empty"));
    }

    if job.is_empty() {
        return Err(KirkError::invalid_argument("job name is empty"));
    }

    let mut encoded = format!("{project}::{job}");
    if !params.is_empty() {
        encoded.push('[');
        encoded.push_str(&join_params(params));
        encoded.push(']');
    }

    Ok(encoded)
}

/// Decodes a token string.
///
/// Whitespace is ignored. `Ok(None)` is returned when the token does not
/// have the `project::job` shape; malformed fragments inside the brackets
/// are skipped.
pub fn decode(token: &str) -> KirkResult<Option<JobToken>> {
    if token.is_empty() {
        return Err(KirkError::invalid_argument("token is empty"));
    }

    let compact: String = token.chars().filter(|c| !c.is_whitespace()).collect();

    let Some(captures) = TOKEN_PATTERN.captures(&compact) else {
        return Ok(None);
    };

    let mut decoded = JobToken::new(&captures["project"], &captures["job"]);

    if let Some(params) = captures.name("params") {
        for param in PARAM_PATTERN.captures_iter(params.as_str()) {
            decoded
                .params
                .insert(param[1].to_string(), param[2].to_string());
        }
    }

    Ok(Some(decoded))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(pairs: &[(&str, &str)]) -> IndexMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_encode_no_params() {
        assert_eq!(
            encode("myproject", "myjob", &IndexMap::new()).unwrap(),
            "myproject::myjob"
        );
    }

    #[test]
    fn test_encode_params_keep_order() {
        assert_eq!(
            encode("myproject", "myjob", &params(&[("param0", "0")])).unwrap(),
            "myproject::myjob[param0=0]"
        );
        assert_eq!(
            encode(
                "myproject",
                "myjob",
                &params(&[("param1", "1"), ("param0", "0")])
            )
            .unwrap(),
            "myproject::myjob[param1=1,param0=0]"
        );
    }

    #[test]
    fn test_encode_errors() {
        let err = encode("", "myjob", &IndexMap::new()).unwrap_err();
        assert!(matches!(err, KirkError::InvalidArgument(ref m) if m == "project name is empty"));

        let err = encode("myproject", "", &IndexMap::new()).unwrap_err();
        assert!(matches!(err, KirkError::InvalidArgument(ref m) if m == "job name is empty"));
    }

    #[test]
    fn test_decode_no_params() {
        let token = decode("myproject::myjob").unwrap().unwrap();
        assert_eq!(token, JobToken::new("myproject", "myjob"));
    }

    #[test]
    fn test_decode_multiple_params() {
        let token = decode("myproject::myjob[param0=0,param1=1]")
            .unwrap()
            .unwrap();
        assert_eq!(token.params, params(&[("param0", "0"), ("param1", "1")]));
    }

    #[test]
    fn test_decode_params_with_spaces() {
        let token = decode(" myproject::myjob[param0=0,      param1=1] ")
            .unwrap()
            .unwrap();
        assert_eq!(token.project, "myproject");
        assert_eq!(token.params, params(&[("param0", "0"), ("param1", "1")]));
    }

    #[test]
    fn test_decode_empty_token() {
        let err = decode("").unwrap_err();
        assert!(matches!(err, KirkError::InvalidArgument(ref m) if m == "token is empty"));
    }

    #[test]
    fn test_decode_no_match() {
        assert_eq!(decode("myproject:").unwrap(), None);
        assert_eq!(decode("::this_job_doesnt_exist").unwrap(), None);
        assert_eq!(decode("[PARam=1]this_job_doesnt_exist").unwrap(), None);
        assert_eq!(decode("mytest_1[PARAM_ZERO=zero]").unwrap(), None);
    }

    #[test]
    fn test_decode_skips_malformed_params() {
        // brackets that do not match as a whole are ignored
        let token = decode("proj::job[a=1,b=,=2,c=3]").unwrap().unwrap();
        assert_eq!(token, JobToken::new("proj", "job"));

        let token = decode("proj::job[a=1,junk]").unwrap().unwrap();
        assert!(token.params.is_empty());

        // fragments are extracted independently of the outer match
        let token = decode("proj::job[a=1b=2]").unwrap().unwrap();
        assert_eq!(token.params, params(&[("a", "1b")]));
    }

    #[test]
    fn test_round_trip() {
        let original = params(&[("PARAM_0", "zero"), ("PARAM_1", "1")]);
        let encoded = encode("project_1", "mytest_1", &original).unwrap();
        let token = decode(&encoded).unwrap().unwrap();

        assert_eq!(token.project, "project_1");
        assert_eq!(token.job, "mytest_1");
        assert_eq!(token.params, original);
        assert_eq!(token.to_string(), encoded);
    }
}
