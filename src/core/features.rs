use crate::core::encoders::EncoderRegistry;
use crate::domain::model::{CategoricalField, FeatureVector, ValidatedRequest};
use crate::utils::error::Result;

/// 將完整寫法轉成訓練資料使用的代碼，其他值原樣保留
pub fn normalize_gender(raw: &str) -> &str {
    match raw {
        "Female" => "F",
        "Male" => "M",
        other => other,
    }
}

#[derive(Debug, Clone, Copy)]
pub struct FeatureBuilder<'a> {
    registry: &'a EncoderRegistry,
}

impl<'a> FeatureBuilder<'a> {
    pub fn new(registry: &'a EncoderRegistry) -> Self {
        Self { registry }
    }

    /// 依訓練時的欄位順序組出特徵向量
    ///
    /// 不假設 Validator 已經跑過：任何編碼查詢失敗都回傳 `EncodingError`。
    pub fn build(&self, request: &ValidatedRequest) -> Result<FeatureVector> {
        let code = |field: CategoricalField| -> Result<f64> {
            let raw = request.categorical(field);
            let value = match field {
                CategoricalField::Gender => normalize_gender(raw),
                _ => raw,
            };
            self.registry.encode(field, value).map(f64::from)
        };

        Ok(FeatureVector::new([
            request.age,
            code(CategoricalField::Gender)?,
            code(CategoricalField::MaritalStatus)?,
            code(CategoricalField::State)?,
            code(CategoricalField::ProductCategory)?,
            code(CategoricalField::AgeGroup)?,
            request.orders,
        ]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::encoders::tests::sample_registry;
    use crate::utils::error::PredictorError;

    fn request(gender: &str) -> ValidatedRequest {
        ValidatedRequest {
            age: 30.0,
            gender: gender.to_string(),
            marital_status: "Single".to_string(),
            state: "Delhi".to_string(),
            product_category: "Electronics".to_string(),
            age_group: "26-35".to_string(),
            orders: 5.0,
        }
    }

    #[test]
    fn test_normalize_gender() {
        assert_eq!(normalize_gender("Male"), "M");
        assert_eq!(normalize_gender("Female"), "F");
        assert_eq!(normalize_gender("M"), "M");
        assert_eq!(normalize_gender("other"), "other");
        // 冪等
        assert_eq!(normalize_gender(normalize_gender("Male")), "M");
    }

    #[test]
    fn test_builds_vector_in_training_order() {
        let registry = sample_registry();
        let vector = FeatureBuilder::new(&registry).build(&request("Male")).unwrap();
        assert_eq!(vector.as_slice(), &[30.0, 1.0, 1.0, 0.0, 1.0, 1.0, 5.0]);
    }

    #[test]
    fn test_male_and_m_encode_identically() {
        let registry = sample_registry();
        let builder = FeatureBuilder::new(&registry);
        assert_eq!(
            builder.build(&request("Male")).unwrap(),
            builder.build(&request("M")).unwrap()
        );
    }

    #[test]
    fn test_unvalidated_value_is_an_encoding_error() {
        let registry = sample_registry();
        let mut req = request("F");
        req.product_category = "Toys".to_string();

        let err = FeatureBuilder::new(&registry).build(&req).unwrap_err();
        assert!(
            matches!(err, PredictorError::EncodingError { ref field, .. } if field == "productCategory")
        );
        assert!(err.is_client_error());
    }
}
