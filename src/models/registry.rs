use crate::models::{ModelSpec, OnnxClassifier, ProbabilityModel};
use crate::utils::error::ClassifyError;
use crate::{Config, Result};
use serde::Serialize;
use std::path::Path;
use std::sync::Arc;

/// 单个模型槽位：加载失败时保留原因，只影响该分支
pub struct ModelSlot {
    spec: ModelSpec,
    handle: std::result::Result<Arc<dyn ProbabilityModel>, String>,
}

impl ModelSlot {
    pub fn ready(model: Arc<dyn ProbabilityModel>) -> Self {
        Self {
            spec: model.spec(),
            handle: Ok(model),
        }
    }

    pub fn unavailable(spec: ModelSpec, reason: impl Into<String>) -> Self {
        Self {
            spec,
            handle: Err(reason.into()),
        }
    }

    fn load(spec: ModelSpec, path: &Path, config: &Config) -> Self {
        match OnnxClassifier::load(spec, path, config) {
            Ok(model) => {
                tracing::info!("{} model loaded successfully", spec.name);
                Self::ready(Arc::new(model))
            }
            Err(e) => {
                tracing::warn!("Failed to load {} model: {}", spec.name, e);
                Self::unavailable(spec, e.to_string())
            }
        }
    }

    pub fn spec(&self) -> ModelSpec {
        self.spec
    }

    pub fn model(&self) -> Result<Arc<dyn ProbabilityModel>> {
        self.handle
            .as_ref()
            .map(Arc::clone)
            .map_err(|reason| ClassifyError::ModelLoad(reason.clone()))
    }

    pub fn is_ready(&self) -> bool {
        self.handle.is_ok()
    }
}

/// 进程级只读模型注册表，启动时构建一次
pub struct ModelRegistry {
    slots: Vec<ModelSlot>,
}

impl ModelRegistry {
    pub fn load(config: &Config) -> Result<Self> {
        tracing::info!("Initializing model registry...");

        let registry = Self::from_slots(vec![
            ModelSlot::load(ModelSpec::RESNET, &config.resnet_model_path(), config),
            ModelSlot::load(ModelSpec::INCEPTION, &config.inception_model_path(), config),
        ]);

        if !registry.slots.iter().any(ModelSlot::is_ready) {
            return Err(ClassifyError::ModelLoad(format!(
                "No classification model could be loaded from {}",
                config.models_dir.display()
            )));
        }

        tracing::info!("Model registry initialized successfully");
        Ok(registry)
    }

    pub fn from_slots(slots: Vec<ModelSlot>) -> Self {
        Self { slots }
    }

    /// 按固定顺序（ResNet, Inception）遍历
    pub fn slots(&self) -> &[ModelSlot] {
        &self.slots
    }

    /// 模型健康检查
    pub fn health_check(&self) -> Result<()> {
        tracing::debug!("Performing model health check...");

        let unavailable: Vec<&str> = self
            .slots
            .iter()
            .filter(|slot| !slot.is_ready())
            .map(|slot| slot.spec.name)
            .collect();

        if unavailable.len() == self.slots.len() {
            return Err(ClassifyError::ModelLoad(
                "No classification model available".to_string(),
            ));
        }
        if !unavailable.is_empty() {
            tracing::debug!("Degraded: unavailable models {:?}", unavailable);
        }

        Ok(())
    }

    pub fn stats(&self) -> Vec<ModelStats> {
        self.slots
            .iter()
            .map(|slot| ModelStats {
                name: slot.spec.name,
                input_width: slot.spec.input_width,
                input_height: slot.spec.input_height,
                loaded: slot.is_ready(),
                error: slot.handle.as_ref().err().cloned(),
            })
            .collect()
    }
}

/// 模型统计信息
#[derive(Debug, Clone, Serialize)]
pub struct ModelStats {
    pub name: &'static str,
    pub input_width: u32,
    pub input_height: u32,
    pub loaded: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}
