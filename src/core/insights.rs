use crate::core::features::normalize_gender;
use crate::domain::model::AgeGroupRange;
use crate::utils::error::{PredictorError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

const TOP_STATES: usize = 5;

/// 歷史銷售資料的一列，欄位名稱同時接受兩種訓練資料格式
#[derive(Debug, Clone, Deserialize)]
pub struct SalesRecord {
    #[serde(alias = "Age")]
    pub age: f64,
    #[serde(alias = "Gender")]
    pub gender: String,
    #[serde(alias = "State")]
    pub state: String,
    #[serde(alias = "productCategory", alias = "Product_Category")]
    pub product_category: String,
    #[serde(default, alias = "ageGroup", alias = "Age_Group")]
    pub age_group: Option<String>,
    #[serde(alias = "Amount")]
    pub sales: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupTotal {
    pub label: String,
    pub amount: f64,
}

/// 啟動時計算一次的銷售彙總
#[derive(Debug, Clone, Serialize)]
pub struct SalesInsights {
    pub records: usize,
    pub total_sales: f64,
    pub sales_by_gender: Vec<GroupTotal>,
    pub sales_by_state: Vec<GroupTotal>,
    pub sales_by_category: Vec<GroupTotal>,
    pub sales_by_age_group: Vec<GroupTotal>,
}

impl SalesInsights {
    pub async fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let data = tokio::fs::read(path.as_ref()).await?;
        Self::from_csv(data.as_slice())
    }

    pub fn from_csv<R: std::io::Read>(reader: R) -> Result<Self> {
        let mut csv_reader = csv::Reader::from_reader(reader);
        let mut records = Vec::new();
        for row in csv_reader.deserialize::<SalesRecord>() {
            records.push(row?);
        }
        Self::from_records(&records)
    }

    pub fn from_records(records: &[SalesRecord]) -> Result<Self> {
        if records.is_empty() {
            return Err(PredictorError::ConfigError {
                message: "sales data contains no rows".to_string(),
            });
        }

        let mut by_gender = BTreeMap::new();
        let mut by_state = BTreeMap::new();
        let mut by_category = BTreeMap::new();
        let mut by_age_group = BTreeMap::new();
        let mut total_sales = 0.0;
        let mut skipped_age = 0usize;

        for record in records {
            total_sales += record.sales;
            *by_gender
                .entry(normalize_gender(&record.gender).to_string())
                .or_insert(0.0) += record.sales;
            *by_state.entry(record.state.clone()).or_insert(0.0) += record.sales;
            *by_category
                .entry(record.product_category.clone())
                .or_insert(0.0) += record.sales;

            // 沒有年齡組欄位時由年齡推導
            let age_group = match &record.age_group {
                Some(label) => Some(label.clone()),
                None => AgeGroupRange::for_age(record.age).map(|range| range.label.to_string()),
            };
            match age_group {
                Some(label) => *by_age_group.entry(label).or_insert(0.0) += record.sales,
                None => skipped_age += 1,
            }
        }

        if skipped_age > 0 {
            tracing::warn!(
                "{} sales rows have an age outside every age group and were left out of the age group totals",
                skipped_age
            );
        }

        let mut sales_by_state = descending(by_state);
        sales_by_state.truncate(TOP_STATES);

        Ok(Self {
            records: records.len(),
            total_sales,
            sales_by_gender: by_label(by_gender),
            sales_by_state,
            sales_by_category: descending(by_category),
            sales_by_age_group: by_label(by_age_group),
        })
    }
}

fn by_label(totals: BTreeMap<String, f64>) -> Vec<GroupTotal> {
    totals
        .into_iter()
        .map(|(label, amount)| GroupTotal { label, amount })
        .collect()
}

fn descending(totals: BTreeMap<String, f64>) -> Vec<GroupTotal> {
    let mut groups = by_label(totals);
    groups.sort_by(|a, b| b.amount.total_cmp(&a.amount));
    groups
}
