use crate::models::{ClassLabel, ModelSpec, CLASS_COUNT};
use crate::utils::error::ClassifyError;
use serde::Serialize;

/// 单次推理输出的类别概率，下标 i 对应 `ClassLabel::ALL[i]`
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(transparent)]
pub struct ProbabilityVector([f32; CLASS_COUNT]);

impl ProbabilityVector {
    pub fn new(scores: [f32; CLASS_COUNT]) -> Self {
        Self(scores)
    }

    pub fn scores(&self) -> &[f32; CLASS_COUNT] {
        &self.0
    }

    pub fn score(&self, label: ClassLabel) -> f32 {
        self.0[label.index()]
    }

    pub fn iter(&self) -> impl Iterator<Item = (ClassLabel, f32)> + '_ {
        ClassLabel::ALL.iter().copied().zip(self.0.iter().copied())
    }
}

impl TryFrom<Vec<f32>> for ProbabilityVector {
    type Error = ClassifyError;

    fn try_from(scores: Vec<f32>) -> Result<Self, Self::Error> {
        let len = scores.len();
        let scores: [f32; CLASS_COUNT] = scores.try_into().map_err(|_| {
            ClassifyError::Inference(format!(
                "Model output has {} scores, expected {}",
                len, CLASS_COUNT
            ))
        })?;
        Ok(Self(scores))
    }
}

/// 排序后的单条预测
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Prediction {
    pub label: ClassLabel,
    pub score: f32,
}

impl Prediction {
    /// 百分比字符串，保留两位小数
    pub fn percentage(&self) -> String {
        format!("{:.2}%", self.score * 100.0)
    }
}

/// 按得分降序排列的预测列表
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct RankedPrediction(pub(crate) Vec<Prediction>);

impl RankedPrediction {
    pub fn entries(&self) -> &[Prediction] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// 两列表格：(类别, 百分比)
    pub fn rows(&self) -> Vec<DisplayRow> {
        self.0
            .iter()
            .map(|p| DisplayRow {
                class_name: p.label.name(),
                probability: p.percentage(),
            })
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DisplayRow {
    pub class_name: &'static str,
    pub probability: String,
}

/// 单个模型分支的结果
#[derive(Debug, Clone, Serialize)]
pub struct ModelReport {
    pub model: &'static str,
    pub input_size: [u32; 2],
    #[serde(flatten)]
    pub outcome: ModelOutcome,
}

impl ModelReport {
    pub fn new(spec: ModelSpec, outcome: ModelOutcome) -> Self {
        Self {
            model: spec.name,
            input_size: [spec.input_width, spec.input_height],
            outcome,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ModelOutcome {
    Ok {
        predictions: Vec<DisplayRow>,
        probabilities: ProbabilityVector,
        inference_ms: u64,
    },
    Failed {
        code: &'static str,
        error: String,
    },
}

impl ModelOutcome {
    pub fn is_ok(&self) -> bool {
        matches!(self, ModelOutcome::Ok { .. })
    }
}

/// 完整的分类结果
#[derive(Debug, Clone, Serialize)]
pub struct ClassificationReport {
    /// 处理耗时（秒）
    pub processing_time: f32,
    pub image_size: [u32; 2],
    pub models: Vec<ModelReport>,
}
