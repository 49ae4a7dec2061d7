use crate::domain::model::{AgeGroupRange, CategoricalField};
use crate::domain::ports::{ArtifactStore, ConfigProvider};
use crate::utils::error::{PredictorError, Result};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// 編碼器 artifact 的持久化格式，code 即 classes 中的位置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EncoderArtifact {
    pub field: Option<CategoricalField>,
    pub classes: Vec<String>,
}

/// 單一欄位的標籤編碼器，載入後不可變
#[derive(Debug, Clone)]
pub struct CategoricalEncoder {
    field: CategoricalField,
    classes: Vec<String>,
    codes: HashMap<String, u32>,
}

impl CategoricalEncoder {
    pub fn new(field: CategoricalField, classes: Vec<String>) -> Result<Self> {
        let artifact = format!("{} encoder", field);
        if classes.is_empty() {
            return Err(PredictorError::ArtifactError {
                name: artifact.clone(),
                message: format!("encoder for {} has an empty vocabulary", field),
            });
        }

        let mut codes = HashMap::with_capacity(classes.len());
        for (idx, label) in classes.iter().enumerate() {
            let code = u32::try_from(idx).map_err(|_| PredictorError::ArtifactError {
                name: artifact.clone(),
                message: format!("encoder for {} has too many classes", field),
            })?;
            if codes.insert(label.clone(), code).is_some() {
                return Err(PredictorError::ArtifactError {
                    name: artifact.clone(),
                    message: format!("encoder for {} lists {:?} twice", field, label),
                });
            }
        }

        Ok(Self {
            field,
            classes,
            codes,
        })
    }

    pub fn from_artifact(field: CategoricalField, name: &str, bytes: &[u8]) -> Result<Self> {
        let artifact: EncoderArtifact =
            serde_json::from_slice(bytes).map_err(|e| PredictorError::ArtifactError {
                name: name.to_string(),
                message: format!("not a valid encoder artifact: {}", e),
            })?;

        if let Some(declared) = artifact.field {
            if declared != field {
                return Err(PredictorError::ArtifactError {
                    name: name.to_string(),
                    message: format!("encoder was fitted for {}, loaded as {}", declared, field),
                });
            }
        }

        Self::new(field, artifact.classes).map_err(|e| match e {
            PredictorError::ArtifactError { message, .. } => PredictorError::ArtifactError {
                name: name.to_string(),
                message,
            },
            other => other,
        })
    }

    pub fn field(&self) -> CategoricalField {
        self.field
    }

    pub fn encode(&self, value: &str) -> Result<u32> {
        self.codes
            .get(value)
            .copied()
            .ok_or_else(|| PredictorError::EncodingError {
                field: self.field.to_string(),
                value: value.to_string(),
            })
    }

    pub fn contains(&self, value: &str) -> bool {
        self.codes.contains_key(value)
    }

    /// 依 code 排序的詞彙表
    pub fn vocabulary(&self) -> &[String] {
        &self.classes
    }
}

/// 每個類別欄位各自一個編碼器，code 不跨欄位共用
#[derive(Debug, Clone)]
pub struct EncoderRegistry {
    gender: CategoricalEncoder,
    marital_status: CategoricalEncoder,
    state: CategoricalEncoder,
    product_category: CategoricalEncoder,
    age_group: CategoricalEncoder,
}

impl EncoderRegistry {
    pub fn new(encoders: Vec<CategoricalEncoder>) -> Result<Self> {
        let mut by_field: HashMap<CategoricalField, CategoricalEncoder> = HashMap::new();
        for encoder in encoders {
            let field = encoder.field();
            if by_field.insert(field, encoder).is_some() {
                return Err(PredictorError::ArtifactError {
                    name: format!("{} encoder", field),
                    message: "more than one encoder supplied".to_string(),
                });
            }
        }

        let mut take = |field: CategoricalField| {
            by_field
                .remove(&field)
                .ok_or_else(|| PredictorError::ArtifactNotFound {
                    name: format!("{} encoder", field),
                })
        };

        let registry = Self {
            gender: take(CategoricalField::Gender)?,
            marital_status: take(CategoricalField::MaritalStatus)?,
            state: take(CategoricalField::State)?,
            product_category: take(CategoricalField::ProductCategory)?,
            age_group: take(CategoricalField::AgeGroup)?,
        };
        registry.warn_on_age_group_drift();
        Ok(registry)
    }

    /// 從 artifact store 載入全部編碼器，任何失敗都是致命的
    pub async fn load<S: ArtifactStore, C: ConfigProvider>(store: &S, config: &C) -> Result<Self> {
        let mut encoders = Vec::with_capacity(CategoricalField::ALL.len());
        for field in CategoricalField::ALL {
            let name = config.encoder_artifact(field);
            let bytes = store.load(name).await?;
            let encoder = CategoricalEncoder::from_artifact(field, name, &bytes)?;
            tracing::debug!(
                "Loaded encoder for {} from {} ({} classes)",
                field,
                name,
                encoder.vocabulary().len()
            );
            encoders.push(encoder);
        }
        Self::new(encoders)
    }

    pub fn get(&self, field: CategoricalField) -> &CategoricalEncoder {
        match field {
            CategoricalField::Gender => &self.gender,
            CategoricalField::MaritalStatus => &self.marital_status,
            CategoricalField::State => &self.state,
            CategoricalField::ProductCategory => &self.product_category,
            CategoricalField::AgeGroup => &self.age_group,
        }
    }

    pub fn encode(&self, field: CategoricalField, value: &str) -> Result<u32> {
        self.get(field).encode(value)
    }

    pub fn vocabulary(&self, field: CategoricalField) -> &[String] {
        self.get(field).vocabulary()
    }

    /// 以請求欄位名稱為鍵的全部詞彙表
    pub fn vocabularies(&self) -> BTreeMap<&'static str, Vec<String>> {
        CategoricalField::ALL
            .iter()
            .map(|field| (field.request_key(), self.vocabulary(*field).to_vec()))
            .collect()
    }

    fn warn_on_age_group_drift(&self) {
        for label in AgeGroupRange::labels() {
            if !self.age_group.contains(&label) {
                tracing::warn!(
                    "Age group {} has a validation range but no code in the age group encoder",
                    label
                );
            }
        }
    }
}
