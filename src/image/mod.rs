pub mod loader;
pub mod preprocessing;
pub mod postprocessing;

pub use loader::ImageLoader;
pub use preprocessing::ImagePreprocessor;
pub use postprocessing::{ResultRanker, CONFIDENCE_THRESHOLD};
