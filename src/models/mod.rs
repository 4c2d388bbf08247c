pub mod classifier;
pub mod labels;
pub mod registry;

pub use classifier::{ModelSpec, OnnxClassifier, ProbabilityModel};
pub use labels::{ClassLabel, CLASS_COUNT};
pub use registry::{ModelRegistry, ModelSlot, ModelStats};
