use crate::core::encoders::EncoderRegistry;
use crate::core::features::normalize_gender;
use crate::domain::model::{
    AgeGroupRange, CategoricalField, PredictionRequest, ValidatedRequest, REQUIRED_FIELDS,
};
use crate::utils::error::{PredictorError, Result};
use serde_json::Value;

/// 未滿此年齡的紀錄不可為 Married
pub const MINOR_AGE: f64 = 18.0;

const MARRIED: &str = "Married";

/// 驗證原始請求，回傳第一個違規
///
/// 檢查順序：欄位存在 → 數值轉換 → 年齡組存在 → 未成年婚姻規則 → 年齡範圍 → 類別詞彙表。
/// 純函式，相同輸入必得相同結果。
pub fn validate(
    request: &PredictionRequest,
    registry: &EncoderRegistry,
) -> Result<ValidatedRequest> {
    check_presence(request)?;

    let age = parse_number(request, "age")?;
    let orders = parse_number(request, "orders")?;

    let age_group = required_str(request, CategoricalField::AgeGroup)?;
    let range = AgeGroupRange::lookup(age_group).ok_or_else(|| PredictorError::UnknownAgeGroup {
        value: age_group.to_string(),
        expected: AgeGroupRange::labels(),
    })?;

    if age < MINOR_AGE && request.get("maritalStatus").and_then(Value::as_str) == Some(MARRIED) {
        return Err(PredictorError::MinorMarried { age });
    }

    if !range.contains(age) {
        return Err(PredictorError::AgeOutOfRange {
            age,
            age_group: age_group.to_string(),
            min: range.min,
            max: range.max,
        });
    }

    for field in CategoricalField::ALL {
        check_membership(request, registry, field)?;
    }

    Ok(ValidatedRequest {
        age,
        gender: required_str(request, CategoricalField::Gender)?.to_string(),
        marital_status: required_str(request, CategoricalField::MaritalStatus)?.to_string(),
        state: required_str(request, CategoricalField::State)?.to_string(),
        product_category: required_str(request, CategoricalField::ProductCategory)?.to_string(),
        age_group: age_group.to_string(),
        orders,
    })
}

fn check_presence(request: &PredictionRequest) -> Result<()> {
    let missing: Vec<String> = REQUIRED_FIELDS
        .iter()
        .filter(|field| !request.contains(field))
        .map(|field| field.to_string())
        .collect();

    if missing.is_empty() {
        Ok(())
    } else {
        Err(PredictorError::MissingFields { fields: missing })
    }
}

/// 接受 JSON 數字或數字字串，拒絕 NaN 與無限大
fn parse_number(request: &PredictionRequest, field: &str) -> Result<f64> {
    let value = request.get(field).unwrap_or(&Value::Null);
    let parsed = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };

    match parsed {
        Some(n) if n.is_finite() => Ok(n),
        _ => Err(PredictorError::NotNumeric {
            field: field.to_string(),
            value: display_value(value),
        }),
    }
}

fn required_str(request: &PredictionRequest, field: CategoricalField) -> Result<&str> {
    request
        .get(field.request_key())
        .and_then(Value::as_str)
        .ok_or_else(|| PredictorError::InvalidType {
            field: field.request_key().to_string(),
            expected: "a string".to_string(),
        })
}

fn check_membership(
    request: &PredictionRequest,
    registry: &EncoderRegistry,
    field: CategoricalField,
) -> Result<()> {
    let raw = required_str(request, field)?;
    let value = match field {
        CategoricalField::Gender => normalize_gender(raw),
        _ => raw,
    };

    if registry.get(field).contains(value) {
        Ok(())
    } else {
        Err(PredictorError::UnknownCategory {
            field: field.request_key().to_string(),
            value: value.to_string(),
            expected: registry.vocabulary(field).to_vec(),
        })
    }
}

fn display_value(value: &Value) -> String {
    match value {
        Value::String(s) => format!("{:?}", s),
        other => other.to_string(),
    }
}
