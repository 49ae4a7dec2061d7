use crate::core::encoders::EncoderRegistry;
use crate::core::features::FeatureBuilder;
use crate::core::insights::SalesInsights;
use crate::core::predictor::Predictor;
use crate::core::validator;
use crate::domain::model::{FeatureVector, Prediction, PredictionRequest};
use crate::domain::ports::{ArtifactStore, ConfigProvider};
use crate::utils::error::{PredictorError, Result};
use crate::utils::monitor::SystemMonitor;
use chrono::{DateTime, Utc};
use std::fmt;

/// 單一請求在管線中的狀態
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Received,
    Validated,
    Encoded,
    Predicted,
    Responded,
    Failed,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Received => "received",
            Stage::Validated => "validated",
            Stage::Encoded => "encoded",
            Stage::Predicted => "predicted",
            Stage::Responded => "responded",
            Stage::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// 啟動時建立一次的不可變服務狀態，所有請求共用
#[derive(Debug)]
pub struct ServingContext {
    registry: EncoderRegistry,
    predictor: Predictor,
    insights: Option<SalesInsights>,
    monitor: SystemMonitor,
    started_at: DateTime<Utc>,
}

impl ServingContext {
    pub fn new(registry: EncoderRegistry, predictor: Predictor) -> Self {
        Self {
            registry,
            predictor,
            insights: None,
            monitor: SystemMonitor::default(),
            started_at: Utc::now(),
        }
    }

    pub fn with_insights(mut self, insights: SalesInsights) -> Self {
        self.insights = Some(insights);
        self
    }

    pub fn with_monitor(mut self, monitor: SystemMonitor) -> Self {
        self.monitor = monitor;
        self
    }

    /// 載入模型、編碼器與 (可選的) 銷售資料，任何失敗都讓服務拒絕啟動
    pub async fn load<S: ArtifactStore, C: ConfigProvider>(store: &S, config: &C) -> Result<Self> {
        let mut context = Self::load_core(store, config).await?;
        if let Some(path) = config.sales_data_path() {
            let insights = SalesInsights::from_path(path).await?;
            tracing::info!("📈 Loaded {} sales rows from {}", insights.records, path);
            context = context.with_insights(insights);
        }
        Ok(context)
    }

    /// 只載入預測所需的模型與編碼器，不讀銷售資料
    pub async fn load_core<S: ArtifactStore, C: ConfigProvider>(
        store: &S,
        config: &C,
    ) -> Result<Self> {
        tracing::info!("📦 Loading artifacts from {}", store.describe());

        let registry = EncoderRegistry::load(store, config).await?;
        let predictor = Predictor::load(store, config).await?;
        tracing::info!(
            "✅ Loaded {} model with features [{}]",
            predictor.kind(),
            predictor.feature_names().join(", ")
        );

        Ok(Self::new(registry, predictor))
    }

    pub fn registry(&self) -> &EncoderRegistry {
        &self.registry
    }

    pub fn predictor(&self) -> &Predictor {
        &self.predictor
    }

    pub fn insights(&self) -> Option<&SalesInsights> {
        self.insights.as_ref()
    }

    pub fn monitor(&self) -> &SystemMonitor {
        &self.monitor
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    /// Validator → FeatureBuilder，回傳編碼後的特徵向量
    pub fn encode(&self, request: &PredictionRequest) -> Result<FeatureVector> {
        let validated = validator::validate(request, &self.registry)?;
        tracing::debug!(stage = %Stage::Validated, "request validated");

        let features = FeatureBuilder::new(&self.registry).build(&validated)?;
        tracing::debug!(stage = %Stage::Encoded, features = ?features.as_slice(), "features built");
        Ok(features)
    }

    /// 完整管線：第一個失敗即終止
    pub fn predict(&self, request: &PredictionRequest) -> Result<Prediction> {
        tracing::debug!(stage = %Stage::Received, "prediction request");

        let outcome = self.encode(request).and_then(|features| {
            self.predictor
                .predict(&features)
                .map_err(PredictorError::from)
        });

        match outcome {
            Ok(prediction) => {
                tracing::debug!(stage = %Stage::Predicted, prediction, "model evaluated");
                Ok(Prediction { prediction })
            }
            Err(e) => {
                if e.is_client_error() {
                    tracing::debug!(stage = %Stage::Failed, category = ?e.category(), "{}", e);
                } else {
                    tracing::error!(stage = %Stage::Failed, category = ?e.category(), "{}", e);
                }
                Err(e)
            }
        }
    }

    pub fn predict_value(&self, body: serde_json::Value) -> Result<Prediction> {
        let request = PredictionRequest::from_value(body)?;
        self.predict(&request)
    }

    /// 從原始文字解析請求再預測，無法解析的 JSON 屬於輸入錯誤
    pub fn predict_json(&self, raw: &str) -> Result<Prediction> {
        let body = serde_json::from_str::<serde_json::Value>(raw).map_err(|e| {
            PredictorError::InvalidJson {
                message: e.to_string(),
            }
        })?;
        self.predict_value(body)
    }

    /// 單次預測：輸出 `{"prediction"}` 或 `{"error"}` 與對應的結束碼
    pub fn predict_once(&self, raw: &str) -> OneShotOutcome {
        match self.predict_json(raw) {
            Ok(prediction) => OneShotOutcome {
                body: serde_json::json!({ "prediction": prediction.prediction }),
                exit_code: 0,
            },
            Err(e) => OneShotOutcome {
                body: serde_json::json!({ "error": e.user_friendly_message() }),
                exit_code: if e.is_client_error() { 2 } else { 1 },
            },
        }
    }
}

/// `predict-once` 的輸出本文與結束碼 (0 成功，2 輸入錯誤，1 內部錯誤)
#[derive(Debug, Clone, PartialEq)]
pub struct OneShotOutcome {
    pub body: serde_json::Value,
    pub exit_code: i32,
}
