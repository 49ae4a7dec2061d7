use crate::utils::error::{PredictorError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// 請求必須包含的欄位，順序即錯誤訊息中列出的順序
pub const REQUIRED_FIELDS: [&str; 7] = [
    "age",
    "gender",
    "maritalStatus",
    "state",
    "productCategory",
    "ageGroup",
    "orders",
];

/// 訓練時的特徵欄位順序，模型 artifact 必須宣告完全相同的順序
pub const FEATURE_NAMES: [&str; FEATURE_COUNT] = [
    "Age",
    "Gender",
    "Marital_Status",
    "State",
    "Product_Category",
    "Age_Group",
    "Orders",
];

pub const FEATURE_COUNT: usize = 7;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CategoricalField {
    Gender,
    MaritalStatus,
    State,
    ProductCategory,
    AgeGroup,
}

impl CategoricalField {
    pub const ALL: [CategoricalField; 5] = [
        CategoricalField::Gender,
        CategoricalField::MaritalStatus,
        CategoricalField::State,
        CategoricalField::ProductCategory,
        CategoricalField::AgeGroup,
    ];

    /// 請求 JSON 中的欄位名稱
    pub fn request_key(self) -> &'static str {
        match self {
            CategoricalField::Gender => "gender",
            CategoricalField::MaritalStatus => "maritalStatus",
            CategoricalField::State => "state",
            CategoricalField::ProductCategory => "productCategory",
            CategoricalField::AgeGroup => "ageGroup",
        }
    }

    pub fn default_artifact(self) -> &'static str {
        match self {
            CategoricalField::Gender => "le_gender.json",
            CategoricalField::MaritalStatus => "le_marital.json",
            CategoricalField::State => "le_state.json",
            CategoricalField::ProductCategory => "le_category.json",
            CategoricalField::AgeGroup => "le_age_group.json",
        }
    }
}

impl fmt::Display for CategoricalField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.request_key())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct AgeGroupRange {
    pub label: &'static str,
    pub min: u8,
    pub max: u8,
}

pub const AGE_GROUP_RANGES: [AgeGroupRange; 5] = [
    AgeGroupRange { label: "18-25", min: 18, max: 25 },
    AgeGroupRange { label: "26-35", min: 26, max: 35 },
    AgeGroupRange { label: "36-45", min: 36, max: 45 },
    AgeGroupRange { label: "46-55", min: 46, max: 55 },
    AgeGroupRange { label: "56-70", min: 56, max: 70 },
];

impl AgeGroupRange {
    pub fn lookup(label: &str) -> Option<&'static AgeGroupRange> {
        AGE_GROUP_RANGES.iter().find(|range| range.label == label)
    }

    /// 年齡所屬的年齡組 (用於從原始資料推導年齡組)
    pub fn for_age(age: f64) -> Option<&'static AgeGroupRange> {
        AGE_GROUP_RANGES.iter().find(|range| range.contains(age))
    }

    pub fn labels() -> Vec<String> {
        AGE_GROUP_RANGES
            .iter()
            .map(|range| range.label.to_string())
            .collect()
    }

    /// 閉區間 [min, max]
    pub fn contains(&self, age: f64) -> bool {
        age >= f64::from(self.min) && age <= f64::from(self.max)
    }
}

/// 原始請求，解析後不再修改
#[derive(Debug, Clone, PartialEq)]
pub struct PredictionRequest {
    fields: serde_json::Map<String, serde_json::Value>,
}

impl PredictionRequest {
    pub fn from_value(value: serde_json::Value) -> Result<Self> {
        match value {
            serde_json::Value::Object(fields) => Ok(Self { fields }),
            _ => Err(PredictorError::InvalidType {
                field: "request body".to_string(),
                expected: "a JSON object".to_string(),
            }),
        }
    }

    pub fn get(&self, key: &str) -> Option<&serde_json::Value> {
        self.fields.get(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.fields.contains_key(key)
    }
}

impl From<serde_json::Map<String, serde_json::Value>> for PredictionRequest {
    fn from(fields: serde_json::Map<String, serde_json::Value>) -> Self {
        Self { fields }
    }
}

/// 通過驗證的請求，gender 保留原始寫法，由 FeatureBuilder 正規化
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedRequest {
    pub age: f64,
    pub gender: String,
    pub marital_status: String,
    pub state: String,
    pub product_category: String,
    pub age_group: String,
    pub orders: f64,
}

impl ValidatedRequest {
    pub fn categorical(&self, field: CategoricalField) -> &str {
        match field {
            CategoricalField::Gender => &self.gender,
            CategoricalField::MaritalStatus => &self.marital_status,
            CategoricalField::State => &self.state,
            CategoricalField::ProductCategory => &self.product_category,
            CategoricalField::AgeGroup => &self.age_group,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FeatureVector([f64; FEATURE_COUNT]);

impl FeatureVector {
    pub fn new(values: [f64; FEATURE_COUNT]) -> Self {
        Self(values)
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }

    pub fn get(&self, name: &str) -> Option<f64> {
        FEATURE_NAMES
            .iter()
            .position(|feature| *feature == name)
            .map(|idx| self.0[idx])
    }

    pub fn named(&self) -> impl Iterator<Item = (&'static str, f64)> + '_ {
        FEATURE_NAMES.iter().copied().zip(self.0.iter().copied())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    pub prediction: f64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_age_group_lookup_is_inclusive() {
        let range = AgeGroupRange::lookup("26-35").unwrap();
        assert!(range.contains(26.0));
        assert!(range.contains(35.0));
        assert!(!range.contains(25.9));
        assert!(!range.contains(36.0));
        assert!(AgeGroupRange::lookup("0-17").is_none());
    }

    #[test]
    fn test_age_group_for_age() {
        assert_eq!(AgeGroupRange::for_age(18.0).unwrap().label, "18-25");
        assert_eq!(AgeGroupRange::for_age(70.0).unwrap().label, "56-70");
        assert!(AgeGroupRange::for_age(17.0).is_none());
        assert!(AgeGroupRange::for_age(25.5).is_none());
    }

    #[test]
    fn test_request_must_be_object() {
        assert!(PredictionRequest::from_value(json!({"age": 30})).is_ok());
        assert!(PredictionRequest::from_value(json!([1, 2, 3])).is_err());
        assert!(PredictionRequest::from_value(json!("age")).is_err());
    }

    #[test]
    fn test_feature_vector_named_access() {
        let vector = FeatureVector::new([30.0, 1.0, 1.0, 0.0, 1.0, 1.0, 5.0]);
        assert_eq!(vector.get("Age"), Some(30.0));
        assert_eq!(vector.get("Orders"), Some(5.0));
        assert_eq!(vector.get("Festival"), None);
        let names: Vec<_> = vector.named().map(|(name, _)| name).collect();
        assert_eq!(names, FEATURE_NAMES.to_vec());
    }
}
