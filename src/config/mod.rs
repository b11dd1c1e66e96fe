#[cfg(feature = "cli")]
pub mod cli;

use crate::utils::error::{AdapterError, Result};
use crate::utils::validation::{validate_non_empty_string, validate_url, Validate};
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdapterConfig {
    pub server: ServerConfig,
    #[serde(default)]
    pub classes: ClassConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub url: String,
    pub application_id: String,
    pub javascript_key: String,
}

/// 五個遠端類別的名稱（可在 TOML 中覆寫）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassConfig {
    #[serde(default = "default_user_data_class")]
    pub user_data: String,
    #[serde(default = "default_location_class")]
    pub location: String,
    #[serde(default = "default_shared_data_class")]
    pub shared_data: String,
    #[serde(default = "default_key_value_data_class")]
    pub key_value_data: String,
    #[serde(default = "default_dashboard_class")]
    pub dashboard: String,
}

impl Default for ClassConfig {
    fn default() -> Self {
        Self {
            user_data: default_user_data_class(),
            location: default_location_class(),
            shared_data: default_shared_data_class(),
            key_value_data: default_key_value_data_class(),
            dashboard: default_dashboard_class(),
        }
    }
}

fn default_user_data_class() -> String {
    "UserData".to_string()
}

fn default_location_class() -> String {
    "Location".to_string()
}

fn default_shared_data_class() -> String {
    "SharedData".to_string()
}

fn default_key_value_data_class() -> String {
    "KeyValueData".to_string()
}

fn default_dashboard_class() -> String {
    "Dashboard".to_string()
}

impl AdapterConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(AdapterError::IoError)?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        // 處理環境變數替換
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| AdapterError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// 替換環境變數 (例如 ${APP_ID})
    fn substitute_env_vars(content: &str) -> Result<String> {
        use regex::Regex;
        let re = Regex::new(r"\$\{([^}]+)\}").unwrap();

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    /// 驗證配置的合理性
    pub fn validate_config(&self) -> Result<()> {
        validate_url("server.url", &self.server.url)?;
        validate_non_empty_string("server.application_id", &self.server.application_id)?;
        validate_non_empty_string("server.javascript_key", &self.server.javascript_key)?;

        validate_non_empty_string("classes.user_data", &self.classes.user_data)?;
        validate_non_empty_string("classes.location", &self.classes.location)?;
        validate_non_empty_string("classes.shared_data", &self.classes.shared_data)?;
        validate_non_empty_string("classes.key_value_data", &self.classes.key_value_data)?;
        validate_non_empty_string("classes.dashboard", &self.classes.dashboard)?;

        Ok(())
    }
}

impl Validate for AdapterConfig {
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
[server]
url = "https://backend.example.com/parse"
application_id = "app123"
javascript_key = "js456"
"#;

        let config = AdapterConfig::from_toml_str(toml_content).unwrap();

        assert_eq!(config.server.url, "https://backend.example.com/parse");
        assert_eq!(config.server.application_id, "app123");
        // 類別名稱未設定時使用預設值
        assert_eq!(config.classes.user_data, "UserData");
        assert_eq!(config.classes.dashboard, "Dashboard");
    }

    #[test]
    fn test_parse_config_with_custom_classes() {
        let toml_content = r#"
[server]
url = "https://backend.example.com/parse"
application_id = "app123"
javascript_key = "js456"

[classes]
user_data = "AppUserData"
location = "Site"
shared_data = "CommunityData"
key_value_data = "Blob"
dashboard = "Board"
"#;

        let config = AdapterConfig::from_toml_str(toml_content).unwrap();

        assert_eq!(config.classes.user_data, "AppUserData");
        assert_eq!(config.classes.location, "Site");
        assert_eq!(config.classes.shared_data, "CommunityData");
        assert_eq!(config.classes.key_value_data, "Blob");
        assert_eq!(config.classes.dashboard, "Board");
    }

    #[test]
    fn test_env_var_substitution() {
        std::env::set_var("TEST_ADAPTER_APP_ID", "env-app-id");

        let toml_content = r#"
[server]
url = "https://backend.example.com/parse"
application_id = "${TEST_ADAPTER_APP_ID}"
javascript_key = "js456"
"#;

        let config = AdapterConfig::from_toml_str(toml_content).unwrap();
        assert_eq!(config.server.application_id, "env-app-id");

        std::env::remove_var("TEST_ADAPTER_APP_ID");
    }

    #[test]
    fn test_config_validation_rejects_bad_url() {
        let toml_content = r#"
[server]
url = "not-a-url"
application_id = "app123"
javascript_key = "js456"
"#;

        let config = AdapterConfig::from_toml_str(toml_content).unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_validation_rejects_empty_class_name() {
        let toml_content = r#"
[server]
url = "https://backend.example.com/parse"
application_id = "app123"
javascript_key = "js456"

[classes]
dashboard = ""
"#;

        let config = AdapterConfig::from_toml_str(toml_content).unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_from_file() {
        let mut temp_file = NamedTempFile::new().unwrap();

        let toml_content = r#"
[server]
url = "https://backend.example.com/parse"
application_id = "file-app"
javascript_key = "file-key"
"#;

        temp_file.write_all(toml_content.as_bytes()).unwrap();

        let config = AdapterConfig::from_file(temp_file.path()).unwrap();
        assert_eq!(config.server.application_id, "file-app");
    }
}
