use crate::domain::model::{FeatureVector, FEATURE_NAMES};
use crate::domain::ports::{ArtifactStore, ConfigProvider, Regressor};
use crate::utils::error::{ModelError, PredictorError, Result};
use serde::{Deserialize, Serialize};

/// 模型 artifact 的持久化格式
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ModelArtifact {
    Linear(LinearModel),
    TreeEnsemble(TreeEnsemble),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinearModel {
    pub feature_names: Vec<String>,
    pub intercept: f64,
    pub coefficients: Vec<f64>,
}

impl Regressor for LinearModel {
    fn kind(&self) -> &'static str {
        "linear"
    }

    fn feature_names(&self) -> &[String] {
        &self.feature_names
    }

    fn predict_row(&self, features: &[f64]) -> Result<f64> {
        if self.coefficients.len() != features.len() {
            return Err(ModelError::ShapeMismatch {
                expected: self.coefficients.len(),
                got: features.len(),
            }
            .into());
        }

        let sum: f64 = self
            .coefficients
            .iter()
            .zip(features)
            .map(|(coef, x)| coef * x)
            .sum();
        Ok(self.intercept + sum)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TreeNode {
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
    Leaf {
        leaf: f64,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegressionTree {
    pub nodes: Vec<TreeNode>,
}

impl RegressionTree {
    /// `x < threshold` 走左子樹
    fn predict_row(&self, features: &[f64]) -> std::result::Result<f64, ModelError> {
        let mut idx = 0;
        loop {
            match self.nodes.get(idx) {
                Some(TreeNode::Leaf { leaf }) => return Ok(*leaf),
                Some(TreeNode::Split {
                    feature,
                    threshold,
                    left,
                    right,
                }) => {
                    let x = features.get(*feature).ok_or_else(|| ModelError::Corrupt {
                        message: format!("split on missing feature {}", feature),
                    })?;
                    idx = if *x < *threshold { *left } else { *right };
                }
                None => {
                    return Err(ModelError::Corrupt {
                        message: format!("node {} does not exist", idx),
                    })
                }
            }
        }
    }

    /// 子節點必須在父節點之後，確保走訪一定會結束
    fn check(&self, n_features: usize) -> std::result::Result<(), String> {
        if self.nodes.is_empty() {
            return Err("tree has no nodes".to_string());
        }
        for (idx, node) in self.nodes.iter().enumerate() {
            if let TreeNode::Split {
                feature,
                threshold,
                left,
                right,
            } = node
            {
                if *feature >= n_features {
                    return Err(format!("node {} splits on feature {}", idx, feature));
                }
                if !threshold.is_finite() {
                    return Err(format!("node {} has a non-finite threshold", idx));
                }
                for child in [*left, *right] {
                    if child <= idx || child >= self.nodes.len() {
                        return Err(format!("node {} has invalid child {}", idx, child));
                    }
                }
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TreeEnsemble {
    pub feature_names: Vec<String>,
    #[serde(default)]
    pub base_score: f64,
    pub trees: Vec<RegressionTree>,
}

impl Regressor for TreeEnsemble {
    fn kind(&self) -> &'static str {
        "tree_ensemble"
    }

    fn feature_names(&self) -> &[String] {
        &self.feature_names
    }

    fn predict_row(&self, features: &[f64]) -> Result<f64> {
        let mut total = self.base_score;
        for tree in &self.trees {
            total += tree.predict_row(features)?;
        }
        Ok(total)
    }
}

impl ModelArtifact {
    pub fn from_bytes(name: &str, bytes: &[u8]) -> Result<Self> {
        let artifact: ModelArtifact =
            serde_json::from_slice(bytes).map_err(|e| PredictorError::ArtifactError {
                name: name.to_string(),
                message: format!("not a valid model artifact: {}", e),
            })?;
        artifact
            .check()
            .map_err(|message| PredictorError::ArtifactError {
                name: name.to_string(),
                message,
            })?;
        Ok(artifact)
    }

    fn check(&self) -> std::result::Result<(), String> {
        let names = self.feature_names();
        if names.iter().map(String::as_str).ne(FEATURE_NAMES.iter().copied()) {
            return Err(format!(
                "model was trained on features [{}], serving order is [{}]",
                names.join(", "),
                FEATURE_NAMES.join(", ")
            ));
        }

        match self {
            ModelArtifact::Linear(model) => {
                if model.coefficients.len() != names.len() {
                    return Err(format!(
                        "{} coefficients for {} features",
                        model.coefficients.len(),
                        names.len()
                    ));
                }
                if !model.intercept.is_finite() || model.coefficients.iter().any(|c| !c.is_finite())
                {
                    return Err("linear model has non-finite parameters".to_string());
                }
            }
            ModelArtifact::TreeEnsemble(model) => {
                if model.trees.is_empty() {
                    return Err("tree ensemble has no trees".to_string());
                }
                for (idx, tree) in model.trees.iter().enumerate() {
                    tree.check(names.len())
                        .map_err(|e| format!("tree {}: {}", idx, e))?;
                }
            }
        }
        Ok(())
    }

    fn feature_names(&self) -> &[String] {
        match self {
            ModelArtifact::Linear(model) => &model.feature_names,
            ModelArtifact::TreeEnsemble(model) => &model.feature_names,
        }
    }

    pub fn into_regressor(self) -> Box<dyn Regressor> {
        match self {
            ModelArtifact::Linear(model) => Box::new(model),
            ModelArtifact::TreeEnsemble(model) => Box::new(model),
        }
    }
}

/// 包裝已載入的模型，推論失敗一律轉成 `ModelError`
#[derive(Debug)]
pub struct Predictor {
    model: Box<dyn Regressor>,
}

impl Predictor {
    pub fn new(model: Box<dyn Regressor>) -> Self {
        Self { model }
    }

    pub fn from_artifact(name: &str, bytes: &[u8]) -> Result<Self> {
        Ok(Self::new(ModelArtifact::from_bytes(name, bytes)?.into_regressor()))
    }

    pub async fn load<S: ArtifactStore, C: ConfigProvider>(store: &S, config: &C) -> Result<Self> {
        let name = config.model_artifact();
        let bytes = store.load(name).await?;
        let predictor = Self::from_artifact(name, &bytes)?;
        tracing::debug!("Loaded {} model from {}", predictor.kind(), name);
        Ok(predictor)
    }

    pub fn kind(&self) -> &'static str {
        self.model.kind()
    }

    pub fn feature_names(&self) -> &[String] {
        self.model.feature_names()
    }

    pub fn predict(&self, features: &FeatureVector) -> std::result::Result<f64, ModelError> {
        let row = features.as_slice();
        let expected = self.model.feature_names().len();
        if row.len() != expected {
            return Err(ModelError::ShapeMismatch {
                expected,
                got: row.len(),
            });
        }

        let value = self.model.predict_row(row).map_err(|e| match e {
            PredictorError::ModelError(inner) => inner,
            other => ModelError::Corrupt {
                message: other.to_string(),
            },
        })?;

        if value.is_finite() {
            Ok(value)
        } else {
            Err(ModelError::NonFinite { value })
        }
    }
}
