use crate::core::ConfigProvider;
use crate::domain::model::CategoricalField;
use crate::utils::error::{PredictorError, Result};
use crate::utils::validation::{self, Validate};
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub server: ListenConfig,
    pub artifacts: ArtifactsConfig,
    pub data: DataConfig,
    pub logging: LoggingConfig,
    pub monitoring: MonitoringConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ListenConfig {
    pub listen: String,
    pub cors: bool,
}

impl Default for ListenConfig {
    fn default() -> Self {
        Self {
            listen: "127.0.0.1:5000".to_string(),
            cors: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArtifactsConfig {
    pub dir: String,
    pub model: String,
    pub gender: String,
    pub marital_status: String,
    pub state: String,
    pub product_category: String,
    pub age_group: String,
}

impl Default for ArtifactsConfig {
    fn default() -> Self {
        Self {
            dir: "./artifacts".to_string(),
            model: "model.json".to_string(),
            gender: CategoricalField::Gender.default_artifact().to_string(),
            marital_status: CategoricalField::MaritalStatus.default_artifact().to_string(),
            state: CategoricalField::State.default_artifact().to_string(),
            product_category: CategoricalField::ProductCategory.default_artifact().to_string(),
            age_group: CategoricalField::AgeGroup.default_artifact().to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DataConfig {
    pub sales_csv: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub json: bool,
    pub verbose: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitoringConfig {
    pub enabled: bool,
}

impl ServerConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(PredictorError::IoError)?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        // 處理環境變數替換
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| PredictorError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// 替換環境變數 (例如 ${ARTIFACTS_DIR})
    fn substitute_env_vars(content: &str) -> Result<String> {
        use regex::Regex;
        // 使用正規表達式匹配 ${VAR_NAME} 格式
        let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| PredictorError::ConfigError {
            message: format!("env var pattern: {}", e),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    /// 驗證配置的合理性
    pub fn validate_config(&self) -> Result<()> {
        validation::validate_socket_addr("server.listen", &self.server.listen)?;
        validation::validate_path("artifacts.dir", &self.artifacts.dir)?;

        let names = self.artifact_names();
        for (field, name) in [
            "artifacts.model",
            "artifacts.gender",
            "artifacts.marital_status",
            "artifacts.state",
            "artifacts.product_category",
            "artifacts.age_group",
        ]
        .iter()
        .zip(names.iter())
        {
            validation::validate_non_empty_string(field, name)?;
            validation::validate_artifact_name(field, name)?;
        }
        // 同一個檔案不能同時當作兩個 artifact
        validation::validate_unique("artifacts", &names)?;

        if let Some(path) = &self.data.sales_csv {
            validation::validate_path("data.sales_csv", path)?;
        }

        Ok(())
    }

    fn artifact_names(&self) -> [&str; 6] {
        [
            self.artifacts.model.as_str(),
            self.artifacts.gender.as_str(),
            self.artifacts.marital_status.as_str(),
            self.artifacts.state.as_str(),
            self.artifacts.product_category.as_str(),
            self.artifacts.age_group.as_str(),
        ]
    }

    pub fn monitoring_enabled(&self) -> bool {
        self.monitoring.enabled
    }
}

impl ConfigProvider for ServerConfig {
    fn artifacts_dir(&self) -> &str {
        &self.artifacts.dir
    }

    fn listen_addr(&self) -> &str {
        &self.server.listen
    }

    fn sales_data_path(&self) -> Option<&str> {
        self.data.sales_csv.as_deref()
    }

    fn model_artifact(&self) -> &str {
        &self.artifacts.model
    }

    fn encoder_artifact(&self, field: CategoricalField) -> &str {
        match field {
            CategoricalField::Gender => &self.artifacts.gender,
            CategoricalField::MaritalStatus => &self.artifacts.marital_status,
            CategoricalField::State => &self.artifacts.state,
            CategoricalField::ProductCategory => &self.artifacts.product_category,
            CategoricalField::AgeGroup => &self.artifacts.age_group,
        }
    }
}

impl Validate for ServerConfig {
    fn validate(&self) -> Result<()> {
        self.validate_config()
    }
}
