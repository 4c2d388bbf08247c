use crate::classify::types::{ClassificationReport, ModelOutcome, ModelReport};
use crate::image::{ImageLoader, ImagePreprocessor, ResultRanker};
use crate::models::{ModelRegistry, ModelSlot};
use crate::utils::error::ClassifyError;
use crate::Result;
use image::{DynamicImage, GenericImageView};
use std::sync::Arc;
use std::time::Instant;

/// 双模型分类流水线
pub struct ClassificationPipeline;

impl ClassificationPipeline {
    /// 处理上传的原始字节
    pub async fn process_bytes(
        registry: Arc<ModelRegistry>,
        bytes: Vec<u8>,
    ) -> Result<ClassificationReport> {
        Self::spawn(registry, move || ImageLoader::from_bytes(&bytes)).await
    }

    /// 处理base64编码的图像
    pub async fn process_base64(
        registry: Arc<ModelRegistry>,
        base64_data: String,
    ) -> Result<ClassificationReport> {
        Self::spawn(registry, move || ImageLoader::from_base64(&base64_data)).await
    }

    // 解码与推理都是CPU密集型，放到阻塞线程池
    async fn spawn<F>(registry: Arc<ModelRegistry>, decode: F) -> Result<ClassificationReport>
    where
        F: FnOnce() -> Result<DynamicImage> + Send + 'static,
    {
        tokio::task::spawn_blocking(move || -> Result<ClassificationReport> {
            let start_time = Instant::now();
            let image = decode()?;
            Ok(Self::classify_image(&registry, &image, start_time))
        })
        .await
        .map_err(|e| ClassifyError::Internal(format!("Classification task failed: {}", e)))?
    }

    /// 依次运行每个模型；单个分支失败只影响该分支
    pub fn classify_image(
        registry: &ModelRegistry,
        image: &DynamicImage,
        start_time: Instant,
    ) -> ClassificationReport {
        let (width, height) = image.dimensions();
        tracing::debug!("Classifying image {}x{}", width, height);

        let models = registry
            .slots()
            .iter()
            .map(|slot| {
                let outcome = Self::run_branch(slot, image);
                ModelReport::new(slot.spec(), outcome)
            })
            .collect::<Vec<_>>();

        let total_time = start_time.elapsed();
        tracing::info!(
            "Classification completed: models={}, succeeded={}, total_time={:.3}s",
            models.len(),
            models.iter().filter(|m| m.outcome.is_ok()).count(),
            total_time.as_secs_f32()
        );

        ClassificationReport {
            processing_time: total_time.as_secs_f32(),
            image_size: [width, height],
            models,
        }
    }

    fn run_branch(slot: &ModelSlot, image: &DynamicImage) -> ModelOutcome {
        let spec = slot.spec();
        let branch_start = Instant::now();

        let result = slot.model().and_then(|model| {
            let input = ImagePreprocessor::preprocess(image, spec.target_size())?;
            model.predict(input)
        });

        match result {
            Ok(probabilities) => {
                let ranked = ResultRanker::rank(&probabilities);
                let inference_ms = branch_start.elapsed().as_millis() as u64;
                tracing::debug!(
                    "{} branch: top={:?}, time={}ms",
                    spec.name,
                    ranked.entries().first().map(|p| p.label.name()),
                    inference_ms
                );
                ModelOutcome::Ok {
                    predictions: ranked.rows(),
                    probabilities,
                    inference_ms,
                }
            }
            Err(e) => {
                tracing::warn!("{} branch failed: {}", spec.name, e);
                ModelOutcome::Failed {
                    code: e.error_code(),
                    error: e.to_string(),
                }
            }
        }
    }
}
