pub mod encoders;
pub mod features;
pub mod insights;
pub mod pipeline;
pub mod predictor;
pub mod validator;

pub use crate::domain::model::{FeatureVector, Prediction, PredictionRequest, ValidatedRequest};
pub use crate::domain::ports::{ArtifactStore, ConfigProvider, Regressor};
pub use crate::utils::error::Result;
