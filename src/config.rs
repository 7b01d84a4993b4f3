use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Configuration for intl-extract
#[derive(Debug, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct ExtractionConfig {
    /// Glob patterns for input files (e.g., ["src/**/*.tsx", "src/**/*.ts"])
    #[serde(default = "default_input")]
    pub input: Vec<String>,

    /// Glob patterns excluded from extraction
    #[serde(default = "default_ignore")]
    pub ignore: Vec<String>,

    /// Import source the marker components and defineMessages must be bound to
    #[serde(default = "default_module_source_name")]
    pub module_source_name: String,

    /// Downgrade extraction errors to warnings that skip just the offending message
    #[serde(default)]
    pub errors_as_warnings: bool,

    /// Permit descriptors without a defaultMessage (stored as "")
    #[serde(default)]
    pub optional_default_messages: bool,

    /// Require a non-empty description on every descriptor
    #[serde(default)]
    pub enforce_descriptions: bool,

    /// Attach {file, line, column} to each extracted descriptor
    #[serde(default)]
    pub extract_source_location: bool,

    /// Output root for per-file JSON manifests; absent means no file is
    /// written and only the metadata side-channel is populated
    #[serde(default)]
    pub messages_dir: Option<PathBuf>,
}

fn default_input() -> Vec<String> {
    vec![
        "src/**/*.js".to_string(),
        "src/**/*.jsx".to_string(),
        "src/**/*.ts".to_string(),
        "src/**/*.tsx".to_string(),
    ]
}

fn default_ignore() -> Vec<String> {
    vec!["**/node_modules/**".to_string()]
}

fn default_module_source_name() -> String {
    "react-intl".to_string()
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            input: default_input(),
            ignore: default_ignore(),
            module_source_name: default_module_source_name(),
            errors_as_warnings: false,
            optional_default_messages: false,
            enforce_descriptions: false,
            extract_source_location: false,
            messages_dir: None,
        }
    }
}

impl ExtractionConfig {
    /// Load configuration from a JSON file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: ExtractionConfig = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Try to load from the default config file, or return the default config
    pub fn load_or_default<P: AsRef<Path>>(path: Option<P>) -> Result<Self> {
        match path {
            Some(p) => Self::load(p),
            None => {
                let default_path = Path::new("intl-extract.json");
                if default_path.exists() {
                    Self::load(default_path)
                } else {
                    Ok(Self::default())
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_react_intl() {
        let config = ExtractionConfig::default();
        assert_eq!(config.module_source_name, "react-intl");
        assert!(!config.errors_as_warnings);
        assert!(config.messages_dir.is_none());
    }

    #[test]
    fn parses_camel_case_fields() {
        let config = ExtractionConfig::load_or_default::<&Path>(None);
        assert!(config.is_ok());

        let parsed: ExtractionConfig = serde_json::from_str(
            r#"{
                "moduleSourceName": "my-intl",
                "enforceDescriptions": true,
                "messagesDir": "build/messages"
            }"#,
        )
        .unwrap();
        assert_eq!(parsed.module_source_name, "my-intl");
        assert!(parsed.enforce_descriptions);
        assert_eq!(parsed.messages_dir.as_deref(), Some(Path::new("build/messages")));
    }

}
