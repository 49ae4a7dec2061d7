use thiserror::Error;

/// 模型推論失敗
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ModelError {
    #[error("Feature vector has {got} values, model expects {expected}")]
    ShapeMismatch { expected: usize, got: usize },

    #[error("Model produced a non-finite prediction: {value}")]
    NonFinite { value: f64 },

    #[error("Model structure is corrupt: {message}")]
    Corrupt { message: String },
}

impl ModelError {
    /// 非有限輸出通常是極端輸入造成的
    pub fn is_input_shaped(&self) -> bool {
        matches!(self, ModelError::NonFinite { .. })
    }
}

#[derive(Error, Debug)]
pub enum PredictorError {
    #[error("Invalid JSON body: {message}")]
    InvalidJson { message: String },

    #[error("Missing required fields: {}", fields.join(", "))]
    MissingFields { fields: Vec<String> },

    #[error("Invalid numeric value for {field}: {value} is not numeric")]
    NotNumeric { field: String, value: String },

    #[error("Invalid {field}: expected {expected}")]
    InvalidType { field: String, expected: String },

    #[error("Invalid ageGroup: {value}, expected: [{}]", expected.join(", "))]
    UnknownAgeGroup { value: String, expected: Vec<String> },

    #[error("Age {age} does not match ageGroup {age_group} (expected {min}-{max})")]
    AgeOutOfRange {
        age: f64,
        age_group: String,
        min: u8,
        max: u8,
    },

    #[error("Invalid maritalStatus: Married not allowed for age < 18 (age {age})")]
    MinorMarried { age: f64 },

    #[error("Invalid {field} value: {value}, expected: [{}]", expected.join(", "))]
    UnknownCategory {
        field: String,
        value: String,
        expected: Vec<String>,
    },

    #[error("Encoding error: {field} value {value} is not in the fitted vocabulary")]
    EncodingError { field: String, value: String },

    #[error("Prediction failed: {0}")]
    ModelError(#[from] ModelError),

    #[error("Artifact not found: {name}")]
    ArtifactNotFound { name: String },

    #[error("Artifact {name} is invalid: {message}")]
    ArtifactError { name: String, message: String },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("CSV processing error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Invalid configuration value for {field}: {value} ({reason})")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Configuration validation failed for {field}: {message}")]
    ConfigValidationError { field: String, message: String },
}

pub type Result<T> = std::result::Result<T, PredictorError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// 缺欄位、格式錯誤、詞彙表外的值
    Input,
    /// 年齡與年齡組、年齡與婚姻狀態的業務規則
    Consistency,
    Model,
    /// 啟動時的 artifact 載入
    Boot,
    Config,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl PredictorError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            PredictorError::InvalidJson { .. }
            | PredictorError::MissingFields { .. }
            | PredictorError::NotNumeric { .. }
            | PredictorError::InvalidType { .. }
            | PredictorError::UnknownAgeGroup { .. }
            | PredictorError::UnknownCategory { .. }
            | PredictorError::EncodingError { .. } => ErrorCategory::Input,
            PredictorError::AgeOutOfRange { .. } | PredictorError::MinorMarried { .. } => {
                ErrorCategory::Consistency
            }
            PredictorError::ModelError(_) => ErrorCategory::Model,
            PredictorError::ArtifactNotFound { .. }
            | PredictorError::ArtifactError { .. }
            | PredictorError::IoError(_)
            | PredictorError::SerializationError(_)
            | PredictorError::CsvError(_) => ErrorCategory::Boot,
            PredictorError::ConfigError { .. }
            | PredictorError::InvalidConfigValueError { .. }
            | PredictorError::ConfigValidationError { .. } => ErrorCategory::Config,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self.category() {
            ErrorCategory::Input | ErrorCategory::Consistency => ErrorSeverity::Low,
            ErrorCategory::Model => ErrorSeverity::Medium,
            ErrorCategory::Config => ErrorSeverity::High,
            ErrorCategory::Boot => ErrorSeverity::Critical,
        }
    }

    /// 客戶端造成的錯誤 (回應 400)
    pub fn is_client_error(&self) -> bool {
        match self {
            PredictorError::ModelError(e) => e.is_input_shaped(),
            _ => matches!(
                self.category(),
                ErrorCategory::Input | ErrorCategory::Consistency
            ),
        }
    }

    /// 可以安全回傳給呼叫端的訊息，內部錯誤不洩漏細節
    pub fn user_friendly_message(&self) -> String {
        match self.category() {
            ErrorCategory::Input | ErrorCategory::Consistency => self.to_string(),
            ErrorCategory::Model if self.is_client_error() => {
                "Prediction failed: input values produce an out-of-range prediction".to_string()
            }
            ErrorCategory::Model => "Prediction failed: internal model error".to_string(),
            ErrorCategory::Boot => format!("Failed to load model artifacts: {}", self),
            ErrorCategory::Config => format!("Invalid configuration: {}", self),
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self {
            PredictorError::MissingFields { .. } => {
                "Send all of: age, gender, maritalStatus, state, productCategory, ageGroup, orders"
            }
            PredictorError::InvalidJson { .. } => "Send the request as a single JSON object",
            PredictorError::NotNumeric { .. } | PredictorError::InvalidType { .. } => {
                "Check the field types in the request body"
            }
            PredictorError::UnknownAgeGroup { .. }
            | PredictorError::UnknownCategory { .. }
            | PredictorError::EncodingError { .. } => {
                "Use one of the values listed by GET /encoders"
            }
            PredictorError::AgeOutOfRange { .. } => "Pick the ageGroup that contains the given age",
            PredictorError::MinorMarried { .. } => "Records under 18 must not be Married",
            PredictorError::ModelError(_) => {
                "Check that the model artifact was trained on the serving feature order"
            }
            PredictorError::ArtifactNotFound { .. } | PredictorError::IoError(_) => {
                "Check --artifacts-dir and the artifact file names in the config"
            }
            PredictorError::ArtifactError { .. } | PredictorError::SerializationError(_) => {
                "Re-export the artifacts from the training pipeline"
            }
            PredictorError::CsvError(_) => "Check the sales data CSV header and rows",
            PredictorError::ConfigError { .. }
            | PredictorError::InvalidConfigValueError { .. }
            | PredictorError::ConfigValidationError { .. } => {
                "Fix the configuration file or command line flags"
            }
        }
    }
}
