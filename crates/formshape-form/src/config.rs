//! Form pipeline configuration.
//!
//! Loaded from a YAML file or from environment variables. Unset fields
//! keep their defaults.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Controls how [`validate_form`](crate::validate_form) treats a submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineConfig {
    /// Validate data exactly as submitted instead of merging it over the
    /// schema defaults first.
    pub strict: bool,
    /// Force (`true`) or suppress (`false`) the error tree. Unset means
    /// errors are reported only for posted data.
    pub errors: Option<bool>,
    /// Form id. Falls back to the submitted id, then the schema hash.
    pub id: Option<String>,
    /// Coerce wire strings to the schema's leaf types.
    pub coerce: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            strict: false,
            errors: None,
            id: None,
            coerce: true,
        }
    }
}

impl EngineConfig {
    /// Parse a YAML document.
    pub fn from_yaml_str(yaml: &str) -> Result<Self, ConfigError> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    /// Load a YAML file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml_str(&text)
    }

    /// Load configuration from environment variables.
    ///
    /// Variables:
    /// - `FORMSHAPE_STRICT` (default: false)
    /// - `FORMSHAPE_ERRORS` (default: unset)
    /// - `FORMSHAPE_ID` (default: unset)
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = Self::default();
        Ok(Self {
            strict: env_bool("FORMSHAPE_STRICT", &lookup)?.unwrap_or(defaults.strict),
            errors: env_bool("FORMSHAPE_ERRORS", &lookup)?,
            id: lookup("FORMSHAPE_ID").filter(|id| !id.is_empty()),
            coerce: defaults.coerce,
        })
    }
}

fn env_bool(var: &str, lookup: &impl Fn(&str) -> Option<String>) -> Result<Option<bool>, ConfigError> {
    let Some(raw) = lookup(var) else {
        return Ok(None);
    };
    match raw.trim().to_ascii_lowercase().as_str() {
        "" => Ok(None),
        "1" | "true" | "yes" | "on" => Ok(Some(true)),
        "0" | "false" | "no" | "off" => Ok(Some(false)),
        _ => Err(ConfigError::InvalidBool {
            var: var.to_string(),
            value: raw,
        }),
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("cannot read config file {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("{var} must be a boolean, got {value:?}")]
    InvalidBool { var: String, value: String },
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |var| map.get(var).cloned()
    }

    #[test]
    fn defaults_are_lenient() {
        let cfg = EngineConfig::default();
        assert!(!cfg.strict);
        assert!(cfg.coerce);
        assert_eq!(cfg.errors, None);
    }

    #[test]
    fn yaml_overrides_selected_fields() {
        let cfg = EngineConfig::from_yaml_str("strict: true\nid: signup\n").unwrap();
        assert!(cfg.strict);
        assert_eq!(cfg.id.as_deref(), Some("signup"));
        assert!(cfg.coerce);
    }

    #[test]
    fn yaml_rejects_unknown_fields() {
        assert!(matches!(
            EngineConfig::from_yaml_str("stritc: true\n"),
            Err(ConfigError::Yaml(_))
        ));
    }

    #[test]
    fn file_round_trip() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "errors: false\ncoerce: false").unwrap();
        let cfg = EngineConfig::from_file(file.path()).unwrap();
        assert_eq!(cfg.errors, Some(false));
        assert!(!cfg.coerce);
    }

    #[test]
    fn missing_file_reports_path() {
        let err = EngineConfig::from_file(Path::new("/nonexistent/formshape.yaml")).unwrap_err();
        assert!(err.to_string().contains("/nonexistent/formshape.yaml"));
    }

    #[test]
    fn env_variables() {
        let cfg = EngineConfig::from_lookup(lookup(&[
            ("FORMSHAPE_STRICT", "yes"),
            ("FORMSHAPE_ERRORS", "0"),
            ("FORMSHAPE_ID", "login"),
        ]))
        .unwrap();
        assert!(cfg.strict);
        assert_eq!(cfg.errors, Some(false));
        assert_eq!(cfg.id.as_deref(), Some("login"));
    }

    #[test]
    fn env_rejects_non_boolean() {
        let err = EngineConfig::from_lookup(lookup(&[("FORMSHAPE_STRICT", "maybe")])).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidBool { .. }));
    }

    #[test]
    fn empty_env_is_unset() {
        let cfg = EngineConfig::from_lookup(lookup(&[("FORMSHAPE_ERRORS", ""), ("FORMSHAPE_ID", "")])).unwrap();
        assert_eq!(cfg, EngineConfig::default());
    }
}
