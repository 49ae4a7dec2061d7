use crate::utils::error::Result;

/// 持久化的模型與編碼器，啟動時讀取一次
pub trait ArtifactStore: Send + Sync {
    fn load(&self, name: &str) -> impl std::future::Future<Output = Result<Vec<u8>>> + Send;

    /// 用於日誌，描述 artifact 來源
    fn describe(&self) -> String;
}

/// 已訓練好的迴歸模型，只讀
pub trait Regressor: Send + Sync + std::fmt::Debug {
    fn kind(&self) -> &'static str;
    fn feature_names(&self) -> &[String];
    fn predict_row(&self, features: &[f64]) -> Result<f64>;
}

pub trait ConfigProvider: Send + Sync {
    fn artifacts_dir(&self) -> &str;
    fn listen_addr(&self) -> &str;
    fn sales_data_path(&self) -> Option<&str>;
    fn model_artifact(&self) -> &str;
    fn encoder_artifact(&self, field: crate::domain::model::CategoricalField) -> &str;
}
