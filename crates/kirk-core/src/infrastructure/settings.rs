use std::path::{
    Path,
    PathBuf,
};
use std::sync::LazyLock;

use regex::Regex;
use serde::{
    Deserialize,
    Serialize,
};

use crate::{
    KirkError,
    KirkResult,
};

pub const DEFAULT_OWNER: &str = "kirk";
pub const DEFAULT_DEV_FOLDER: &str = "dev";

const MAX_RECURSION_DEPTH: usize = 10;

static VAR_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\$\{([A-Za-z_][A-Za-z0-9_]*)(?::-([^}]*))?\}").expect("Invalid regex pattern")
});

/// Settings of the command-line tool
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Service account used for every remote call
    pub owner: String,
    /// Folder with the project files
    pub projects: PathBuf,
    /// Credential file, used unless `keyring` is set
    pub credentials: PathBuf,
    pub dev_folder: String,
    pub keyring: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            owner: DEFAULT_OWNER.to_string(),
            projects: PathBuf::from("projects"),
            credentials: PathBuf::from("credentials.toml"),
            dev_folder: DEFAULT_DEV_FOLDER.to_string(),
            keyring: false,
        }
    }
}

pub struct SettingsLoader;

impl SettingsLoader {
    pub fn discover_path() -> PathBuf {
        if let Ok(path) = std::env::var("KIRK_CONFIG_PATH") {
            tracing::debug!("Using config path from KIRK_CONFIG_PATH: {}", path);
            return PathBuf::from(path);
        }

        let local = PathBuf::from("kirk.toml");
        if local.exists() {
            tracing::debug!("Using local config path: {}", local.display());
            return local;
        }

        let fallback = dirs::config_dir()
            .map(|dir| dir.join("kirk").join("config.toml"))
            .unwrap_or(local);
        tracing::debug!("Using fallback config path: {}", fallback.display());
        fallback
    }

    pub fn load_default() -> KirkResult<Settings> {
        Self::load(&Self::discover_path())
    }

    /// A missing file yields the default settings.
    pub fn load(path: &Path) -> KirkResult<Settings> {
        if !path.exists() {
            tracing::debug!("No config file at {}, using defaults", path.display());
            return Ok(Settings::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| KirkError::io(path, e))?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> KirkResult<Settings> {
        let mut value: toml::Value = toml::from_str(content)
            .map_err(|e| KirkError::Configuration(format!("Failed to parse TOML: {}", e)))?;

        interpolate_toml(&mut value)?;

        value.try_into().map_err(|e| {
            KirkError::Configuration(format!("Failed to deserialize config: {}", e))
        })
    }
}

/// Expands `${VAR}` and `${VAR:-default}` from the process environment.
pub fn interpolate(input: &str) -> KirkResult<String> {
    interpolate_with_depth(input, 0)
}

fn interpolate_with_depth(input: &str, depth: usize) -> KirkResult<String> {
    if depth > MAX_RECURSION_DEPTH {
        return Err(KirkError::Configuration(
            "Recursive interpolation limit exceeded".to_string(),
        ));
    }

    let mut result = String::with_capacity(input.len());
    let mut last = 0;

    for caps in VAR_PATTERN.captures_iter(input) {
        let (Some(full), Some(name)) = (caps.get(0), caps.get(1)) else {
            continue;
        };

        let replacement = match std::env::var(name.as_str()) {
            Ok(value) => value,
            Err(_) => match caps.get(2) {
                Some(default) => interpolate_with_depth(default.as_str(), depth + 1)?,
                None => {
                    return Err(KirkError::Configuration(format!(
                        "Required environment variable not found: {}",
                        name.as_str()
                    )));
                }
            },
        };

        result.push_str(&input[last..full.start()]);
        result.push_str(&replacement);
        last = full.end();
    }

    result.push_str(&input[last..]);
    Ok(result)
}

fn interpolate_toml(value: &mut toml::Value) -> KirkResult<()> {
    match value {
        toml::Value::String(s) => {
            *s = interpolate(s)?;
        }
        toml::Value::Array(arr) => {
            for item in arr {
                interpolate_toml(item)?;
            }
        }
        toml::Value::Table(table) => {
            for (_, v) in table.iter_mut() {
                interpolate_toml(v)?;
            }
        }
        _ => {}
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = SettingsLoader::parse("").unwrap();
        assert_eq!(settings, Settings::default());
        assert_eq!(settings.owner, "kirk");
        assert_eq!(settings.dev_folder, "dev");
    }

    #[test]
    fn test_parse() {
        let settings = SettingsLoader::parse(
            r#"
owner = "jenkins-bot"
projects = "/srv/kirk/projects"
keyring = true
"#,
        )
        .unwrap();

        assert_eq!(settings.owner, "jenkins-bot");
        assert_eq!(settings.projects, PathBuf::from("/srv/kirk/projects"));
        assert!(settings.keyring);
        assert_eq!(settings.credentials, PathBuf::from("credentials.toml"));
    }

    #[test]
    fn test_interpolation() {
        std::env::set_var("KIRK_TEST_SETTINGS_OWNER", "bot");
        let settings = SettingsLoader::parse(
            r#"
owner = "${KIRK_TEST_SETTINGS_OWNER}"
dev_folder = "${KIRK_TEST_SETTINGS_UNSET:-sandbox}"
"#,
        )
        .unwrap();

        assert_eq!(settings.owner, "bot");
        assert_eq!(settings.dev_folder, "sandbox");
        std::env::remove_var("KIRK_TEST_SETTINGS_OWNER");
    }

    #[test]
    fn test_missing_variable() {
        let err = interpolate("${KIRK_TEST_SETTINGS_MISSING_42}").unwrap_err();
        assert!(matches!(err, KirkError::Configuration(ref m) if m.contains("KIRK_TEST_SETTINGS_MISSING_42")));
    }

    #[test]
    fn test_invalid_toml() {
        assert!(matches!(
            SettingsLoader::parse("owner = "),
            Err(KirkError::Configuration(_))
        ));
        assert!(matches!(
            SettingsLoader::parse("keyring = \"yes\""),
            Err(KirkError::Configuration(_))
        ));
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let settings = SettingsLoader::load(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(settings, Settings::default());
    }
}
