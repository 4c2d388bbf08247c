use crate::utils::error::ClassifyError;
use crate::Result;
use base64::Engine;
use image::{DynamicImage, GenericImageView, ImageFormat};

/// 上传文件大小上限
pub const MAX_IMAGE_BYTES: usize = 20 * 1024 * 1024;

pub struct ImageLoader;

impl ImageLoader {
    /// 从base64字符串加载图像
    pub fn from_base64(base64_data: &str) -> Result<DynamicImage> {
        // 检测并移除可能的数据URL前缀 (data:image/xxx;base64,)
        let base64_clean = match base64_data.strip_prefix("data:") {
            Some(rest) => rest.split_once(',').map(|(_, data)| data).unwrap_or(rest),
            None => base64_data,
        };

        let image_bytes = base64::engine::general_purpose::STANDARD.decode(base64_clean.trim())?;

        Self::from_bytes(&image_bytes)
    }

    /// 从字节流加载图像，仅接受 JPEG / PNG
    pub fn from_bytes(bytes: &[u8]) -> Result<DynamicImage> {
        if bytes.is_empty() {
            return Err(ClassifyError::InvalidInput("Empty image data".to_string()));
        }

        if bytes.len() > MAX_IMAGE_BYTES {
            return Err(ClassifyError::FileTooLarge(bytes.len(), MAX_IMAGE_BYTES));
        }

        match Self::detect_format(bytes) {
            Some(format) if Self::is_supported_format(format) => {}
            Some(format) => {
                return Err(ClassifyError::UnsupportedFormat(format!("{:?}", format)));
            }
            None => {
                return Err(ClassifyError::UnsupportedFormat(
                    "unrecognized image data".to_string(),
                ));
            }
        }

        let image = image::load_from_memory(bytes)?;
        Self::validate_dimensions(&image)?;

        // 强制转换为三通道RGB
        Ok(DynamicImage::ImageRgb8(image.to_rgb8()))
    }

    /// 检测图像格式
    pub fn detect_format(bytes: &[u8]) -> Option<ImageFormat> {
        image::guess_format(bytes).ok()
    }

    pub fn is_supported_format(format: ImageFormat) -> bool {
        matches!(format, ImageFormat::Png | ImageFormat::Jpeg)
    }

    /// 校验 multipart 声明的 MIME 类型
    pub fn is_supported_mime(content_type: &str) -> bool {
        matches!(
            content_type.to_ascii_lowercase().as_str(),
            "image/jpeg" | "image/jpg" | "image/png"
        )
    }

    pub fn validate_dimensions(image: &DynamicImage) -> Result<()> {
        let (width, height) = image.dimensions();

        if width == 0 || height == 0 {
            return Err(ClassifyError::InvalidInput(format!(
                "Image has no pixels: {}x{}",
                width, height
            )));
        }

        if width > 8192 || height > 8192 {
            return Err(ClassifyError::InvalidInput(format!(
                "Image too large: {}x{}, maximum 8192x8192",
                width, height
            )));
        }

        Ok(())
    }
}
