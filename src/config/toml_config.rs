use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::core::registry::BASE_PROXY_PORT;
use crate::utils::error::{PagemarkError, Result};
use crate::utils::validation::{validate_non_empty_string, validate_positive_number, Validate};

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct PagemarkConfig {
    #[serde(default)]
    pub retrieval: RetrievalConfig,
    #[serde(default)]
    pub notes: NotesConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievalConfig {
    /// First port tried when spinning up the reverse proxy.
    #[serde(default = "default_base_port")]
    pub base_port: u16,
    /// Bound on the whole fetch when set; unset preserves the client's
    /// no-timeout behavior.
    pub timeout_seconds: Option<u64>,
    /// Overrides the built-in desktop browser user agent.
    pub user_agent: Option<String>,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            base_port: default_base_port(),
            timeout_seconds: None,
            user_agent: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotesConfig {
    /// Front-matter attribute holding the source URL.
    #[serde(default = "default_url_attribute")]
    pub url_attribute: String,
    /// Folder for captured notes; the notes root when unset.
    pub read_later_folder: Option<String>,
}

impl Default for NotesConfig {
    fn default() -> Self {
        Self {
            url_attribute: default_url_attribute(),
            read_later_folder: None,
        }
    }
}

fn default_base_port() -> u16 {
    BASE_PROXY_PORT
}

fn default_url_attribute() -> String {
    "source".to_string()
}

impl PagemarkConfig {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(PagemarkError::Io)?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| PagemarkError::ConfigValidation {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// Replaces `${VAR_NAME}` with the environment variable's value;
    /// unknown variables are left as-is.
    fn substitute_env_vars(content: &str) -> Result<String> {
        use regex::Regex;
        let re = Regex::new(r"\$\{([^}]+)\}").unwrap();

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    pub fn validate_config(&self) -> Result<()> {
        if self.retrieval.base_port < 1024 {
            return Err(PagemarkError::InvalidConfigValue {
                field: "retrieval.base_port".to_string(),
                value: self.retrieval.base_port.to_string(),
                reason: "Ports below 1024 need elevated privileges".to_string(),
            });
        }

        if let Some(timeout) = self.retrieval.timeout_seconds {
            validate_positive_number("retrieval.timeout_seconds", timeout, 1)?;
        }

        validate_non_empty_string("notes.url_attribute", &self.notes.url_attribute)?;

        if let Some(folder) = &self.notes.read_later_folder {
            validate_non_empty_string("notes.read_later_folder", folder)?;
        }

        Ok(())
    }
}

impl Validate for PagemarkConfig {
    fn validate(&self) -> Result<()> {
        self.validate_config()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_parse_basic_config() {
        let toml_content = r#"
[retrieval]
base_port = 55000
timeout_seconds = 30

[notes]
url_attribute = "readlater"
read_later_folder = "Inbox"
"#;

        let config = PagemarkConfig::from_toml_str(toml_content).unwrap();

        assert_eq!(config.retrieval.base_port, 55000);
        assert_eq!(config.retrieval.timeout_seconds, Some(30));
        assert_eq!(config.notes.url_attribute, "readlater");
        assert_eq!(config.notes.read_later_folder.as_deref(), Some("Inbox"));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_defaults_fill_missing_sections() {
        let config = PagemarkConfig::from_toml_str("").unwrap();

        assert_eq!(config.retrieval.base_port, BASE_PROXY_PORT);
        assert_eq!(config.retrieval.timeout_seconds, None);
        assert_eq!(config.notes.url_attribute, "source");
        assert_eq!(config.notes.read_later_folder, None);
    }

    #[test]
    fn test_env_var_substitution() {
        std::env::set_var("PAGEMARK_TEST_FOLDER", "FromEnv");

        let toml_content = r#"
[notes]
read_later_folder = "${PAGEMARK_TEST_FOLDER}"
"#;

        let config = PagemarkConfig::from_toml_str(toml_content).unwrap();
        assert_eq!(config.notes.read_later_folder.as_deref(), Some("FromEnv"));

        std::env::remove_var("PAGEMARK_TEST_FOLDER");
    }

    #[test]
    fn test_privileged_base_port_fails_validation() {
        let toml_content = r#"
[retrieval]
base_port = 80
"#;

        let config = PagemarkConfig::from_toml_str(toml_content).unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_from_file() {
        let mut temp_file = NamedTempFile::new().unwrap();

        let toml_content = r#"
[retrieval]
base_port = 56000
"#;

        temp_file.write_all(toml_content.as_bytes()).unwrap();

        let config = PagemarkConfig::from_file(temp_file.path()).unwrap();
        assert_eq!(config.retrieval.base_port, 56000);
    }
}
