use crate::utils::error::ClassifyError;
use crate::Result;
use image::{imageops::FilterType, DynamicImage, GenericImageView};
use ndarray::Array4;

pub struct ImagePreprocessor;

impl ImagePreprocessor {
    /// 生成 NHWC 输入张量 (1, H, W, 3)，取值范围 [-1, 1]
    ///
    /// 先按目标尺寸居中裁剪填充（保持宽高比，不拉伸），Lanczos3 重采样，
    /// 再逐元素 `v / 127.5 - 1`。
    pub fn preprocess(image: &DynamicImage, target_size: (u32, u32)) -> Result<Array4<f32>> {
        let (target_w, target_h) = target_size;
        if target_w == 0 || target_h == 0 {
            return Err(ClassifyError::InvalidInput(format!(
                "Invalid target size: {}x{}",
                target_w, target_h
            )));
        }

        let fitted = Self::fit(image, target_w, target_h);
        let rgb = fitted.to_rgb8();

        if rgb.dimensions() != (target_w, target_h) {
            return Err(ClassifyError::ImageProcessing(format!(
                "Resize produced {}x{}, expected {}x{}",
                rgb.width(),
                rgb.height(),
                target_w,
                target_h
            )));
        }

        let tensor = Array4::<f32>::from_shape_fn(
            (1, target_h as usize, target_w as usize, 3),
            |(_, y, x, c)| {
                let pixel = rgb.get_pixel(x as u32, y as u32);
                Self::normalize(pixel[c])
            },
        );

        Ok(tensor)
    }

    /// 居中裁剪到目标宽高比后缩放
    ///
    /// 先裁剪再缩放，中间缓冲区不超过源图大小。
    pub fn fit(image: &DynamicImage, width: u32, height: u32) -> DynamicImage {
        let (x, y, crop_w, crop_h) = Self::crop_rect(image.dimensions(), (width, height));
        image
            .crop_imm(x, y, crop_w, crop_h)
            .resize_exact(width, height, FilterType::Lanczos3)
    }

    /// 与目标宽高比一致的最大居中裁剪区域 (x, y, w, h)
    pub fn crop_rect(source: (u32, u32), target: (u32, u32)) -> (u32, u32, u32, u32) {
        let (src_w, src_h) = (source.0 as u64, source.1 as u64);
        let (dst_w, dst_h) = (target.0.max(1) as u64, target.1.max(1) as u64);

        let (crop_w, crop_h) = if src_w * dst_h >= src_h * dst_w {
            // 源图更宽：保留全部高度
            let w = (src_h * dst_w + dst_h / 2) / dst_h;
            (w.clamp(1, src_w.max(1)), src_h)
        } else {
            let h = (src_w * dst_h + dst_w / 2) / dst_w;
            (src_w, h.clamp(1, src_h.max(1)))
        };

        let x = (src_w - crop_w.min(src_w)) / 2;
        let y = (src_h - crop_h.min(src_h)) / 2;
        (x as u32, y as u32, crop_w as u32, crop_h as u32)
    }

    #[inline]
    pub fn normalize(value: u8) -> f32 {
        value as f32 / 127.5 - 1.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageBuffer, Rgb};

    fn solid(width: u32, height: u32, color: [u8; 3]) -> DynamicImage {
        DynamicImage::ImageRgb8(ImageBuffer::from_pixel(width, height, Rgb(color)))
    }

    #[test]
    fn normalize_maps_byte_range_to_unit_interval() {
        assert_eq!(ImagePreprocessor::normalize(0), -1.0);
        assert_eq!(ImagePreprocessor::normalize(255), 1.0);
        assert!(ImagePreprocessor::normalize(127).abs() < 0.01);
    }

    #[test]
    fn output_shape_is_batch_height_width_channels() {
        let image = solid(640, 480, [10, 200, 30]);

        let tensor = ImagePreprocessor::preprocess(&image, (224, 224)).unwrap();
        assert_eq!(tensor.shape(), &[1, 224, 224, 3]);

        let tensor = ImagePreprocessor::preprocess(&image, (299, 150)).unwrap();
        assert_eq!(tensor.shape(), &[1, 150, 299, 3]);
    }

    #[test]
    fn values_stay_in_range_for_high_contrast_input() {
        // Lanczos 会产生过冲，量化到 u8 后必须仍在范围内
        let image = DynamicImage::ImageRgb8(ImageBuffer::from_fn(97, 61, |x, y| {
            if (x / 3 + y / 3) % 2 == 0 {
                Rgb([255, 255, 255])
            } else {
                Rgb([0, 0, 0])
            }
        }));

        let tensor = ImagePreprocessor::preprocess(&image, (224, 224)).unwrap();
        assert!(tensor.iter().all(|v| (-1.0..=1.0).contains(v)));
    }

    #[test]
    fn solid_colour_survives_resampling() {
        let image = solid(300, 100, [255, 0, 255]);

        let tensor = ImagePreprocessor::preprocess(&image, (32, 32)).unwrap();
        assert_eq!(tensor[[0, 16, 16, 0]], 1.0);
        assert_eq!(tensor[[0, 16, 16, 1]], -1.0);
        assert_eq!(tensor[[0, 16, 16, 2]], 1.0);
    }

    #[test]
    fn fit_crops_instead_of_stretching() {
        // 左半红、右半蓝的宽图；居中裁剪成正方形后两侧颜色仍保留在对应位置
        let image = DynamicImage::ImageRgb8(ImageBuffer::from_fn(400, 100, |x, _| {
            if x < 200 {
                Rgb([255, 0, 0])
            } else {
                Rgb([0, 0, 255])
            }
        }));

        let fitted = ImagePreprocessor::fit(&image, 50, 50).to_rgb8();
        assert_eq!(fitted.dimensions(), (50, 50));
        assert_eq!(fitted.get_pixel(2, 25).0, [255, 0, 0]);
        assert_eq!(fitted.get_pixel(47, 25).0, [0, 0, 255]);
    }

    #[test]
    fn crop_rect_matches_target_aspect() {
        assert_eq!(ImagePreprocessor::crop_rect((400, 100), (50, 50)), (150, 0, 100, 100));
        assert_eq!(ImagePreprocessor::crop_rect((100, 400), (50, 50)), (0, 150, 100, 100));
        assert_eq!(ImagePreprocessor::crop_rect((640, 480), (299, 299)), (80, 0, 480, 480));
        assert_eq!(ImagePreprocessor::crop_rect((224, 224), (224, 224)), (0, 0, 224, 224));
        assert_eq!(ImagePreprocessor::crop_rect((300, 100), (150, 100)), (75, 0, 150, 100));
    }

    #[test]
    fn crop_rect_never_exceeds_source_for_thin_images() {
        assert_eq!(ImagePreprocessor::crop_rect((1, 8192), (299, 299)), (0, 4095, 1, 1));
        assert_eq!(ImagePreprocessor::crop_rect((8192, 1), (299, 299)), (4095, 0, 1, 1));
        assert_eq!(ImagePreprocessor::crop_rect((1, 8192), (224, 224)), (0, 4095, 1, 1));
    }

    #[test]
    fn thin_images_preprocess_to_model_size() {
        let tall = solid(1, 8192, [250, 5, 128]);
        let wide = solid(8192, 1, [3, 99, 251]);

        for image in [tall, wide] {
            let tensor = ImagePreprocessor::preprocess(&image, (299, 299)).unwrap();
            assert_eq!(tensor.shape(), &[1, 299, 299, 3]);
            assert!(tensor.iter().all(|v| (-1.0..=1.0).contains(v)));

            let tensor = ImagePreprocessor::preprocess(&image, (224, 224)).unwrap();
            assert_eq!(tensor.shape(), &[1, 224, 224, 3]);
        }
    }

    #[test]
    fn zero_target_is_rejected() {
        let image = solid(10, 10, [0, 0, 0]);
        assert!(matches!(
            ImagePreprocessor::preprocess(&image, (0, 224)),
            Err(ClassifyError::InvalidInput(_))
        ));
    }
}
