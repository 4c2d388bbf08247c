use crate::classify::ProbabilityVector;
use crate::utils::error::ClassifyError;
use crate::{Config, Result};
use ndarray::Array4;
use ort::{
    inputs,
    session::{builder::GraphOptimizationLevel, Session},
    value::Tensor,
};
use parking_lot::Mutex;
use serde::Serialize;
use std::path::Path;

/// 模型描述：显示名称与输入尺寸 (W, H)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ModelSpec {
    pub name: &'static str,
    pub input_width: u32,
    pub input_height: u32,
}

impl ModelSpec {
    pub const RESNET: ModelSpec = ModelSpec {
        name: "ResNet",
        input_width: 224,
        input_height: 224,
    };

    pub const INCEPTION: ModelSpec = ModelSpec {
        name: "Inception",
        input_width: 299,
        input_height: 299,
    };

    pub fn target_size(&self) -> (u32, u32) {
        (self.input_width, self.input_height)
    }
}

/// 已加载模型的统一接口：NHWC 张量输入，概率向量输出
pub trait ProbabilityModel: Send + Sync {
    fn spec(&self) -> ModelSpec;

    fn predict(&self, input: Array4<f32>) -> Result<ProbabilityVector>;
}

pub struct OnnxClassifier {
    spec: ModelSpec,
    // Session::run 需要 &mut
    session: Mutex<Session>,
    input_name: String,  // 动态发现的输入名称
    output_name: String, // 动态发现的输出名称
}

impl OnnxClassifier {
    pub fn load(spec: ModelSpec, model_path: &Path, config: &Config) -> Result<Self> {
        if !model_path.exists() {
            return Err(ClassifyError::ModelLoad(format!(
                "{} model not found: {}",
                spec.name,
                model_path.display()
            )));
        }

        tracing::info!("Loading {} model from: {}", spec.name, model_path.display());

        let optimization_level = match config.onnx_config.optimization_level {
            0 => GraphOptimizationLevel::Disable,
            1 => GraphOptimizationLevel::Level1,
            2 => GraphOptimizationLevel::Level2,
            _ => GraphOptimizationLevel::Level3,
        };

        let session = Session::builder()
            .and_then(|b| b.with_optimization_level(optimization_level).map_err(Into::into))
            .and_then(|b| b.with_intra_threads(config.onnx_config.intra_threads).map_err(Into::into))
            .and_then(|b| b.commit_from_file(model_path).map_err(Into::into))
            .map_err(|e: ort::Error| {
                ClassifyError::ModelLoad(format!("{} model could not be loaded: {}", spec.name, e))
            })?;

        let input_name = match session.inputs.first() {
            Some(input) => input.name.clone(),
            None => {
                return Err(ClassifyError::ModelLoad(format!(
                    "{} model has no inputs",
                    spec.name
                )))
            }
        };

        // 动态发现输出名称
        let output_name = match session.outputs.first() {
            Some(output) => output.name.clone(),
            None => {
                return Err(ClassifyError::ModelLoad(format!(
                    "{} model has no outputs",
                    spec.name
                )))
            }
        };

        tracing::info!(
            "{} model ready: input='{}', output='{}'",
            spec.name,
            input_name,
            output_name
        );
        for (i, output) in session.outputs.iter().enumerate() {
            tracing::debug!("{} output[{}]: '{}'", spec.name, i, output.name);
        }

        Ok(Self {
            spec,
            session: Mutex::new(session),
            input_name,
            output_name,
        })
    }
}

impl ProbabilityModel for OnnxClassifier {
    fn spec(&self) -> ModelSpec {
        self.spec
    }

    fn predict(&self, input: Array4<f32>) -> Result<ProbabilityVector> {
        let expected = [1, self.spec.input_height as usize, self.spec.input_width as usize, 3];
        if input.shape() != expected {
            return Err(ClassifyError::Inference(format!(
                "{} expects input shape {:?}, got {:?}",
                self.spec.name,
                expected,
                input.shape()
            )));
        }

        let input_tensor = Tensor::from_array(input)?;
        let scores: Vec<f32> = {
            let mut session = self.session.lock();
            let outputs = session.run(inputs![self.input_name.as_str() => input_tensor])?;

            match outputs.get(self.output_name.as_str()) {
                Some(output) => output.try_extract_array::<f32>()?.iter().copied().collect(),
                None => {
                    let available_outputs: Vec<String> =
                        outputs.keys().map(|s| s.to_string()).collect();
                    return Err(ClassifyError::Inference(format!(
                        "{} output '{}' not found. Available outputs: {:?}",
                        self.spec.name, self.output_name, available_outputs
                    )));
                }
            }
        };

        ProbabilityVector::try_from(scores)
    }
}
