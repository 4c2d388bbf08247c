use crate::classify::{Prediction, ProbabilityVector, RankedPrediction};

/// 显示阈值：严格大于才算阳性
pub const CONFIDENCE_THRESHOLD: f32 = 0.5;

/// 结果排序与筛选
pub struct ResultRanker;

impl ResultRanker {
    /// 降序排序后：存在高于阈值的类别则全部保留，否则只保留最高的一个
    pub fn rank(probabilities: &ProbabilityVector) -> RankedPrediction {
        let sorted = Self::sort_descending(probabilities);

        let above: Vec<Prediction> = sorted
            .iter()
            .copied()
            .filter(|p| p.score > CONFIDENCE_THRESHOLD)
            .collect();

        if !above.is_empty() {
            return RankedPrediction(above);
        }

        RankedPrediction(sorted.into_iter().take(1).collect())
    }

    /// 稳定排序，同分时保持原始下标顺序
    ///
    /// 使用 `total_cmp` 保证全序，NaN 不会打乱其余分数的顺序。
    pub fn sort_descending(probabilities: &ProbabilityVector) -> Vec<Prediction> {
        let mut predictions: Vec<Prediction> = probabilities
            .iter()
            .map(|(label, score)| Prediction { label, score })
            .collect();

        predictions.sort_by(|a, b| b.score.total_cmp(&a.score));
        predictions
    }
}
