pub mod pipeline;
pub mod types;

pub use pipeline::ClassificationPipeline;
pub use types::{
    ClassificationReport, DisplayRow, ModelOutcome, ModelReport, Prediction, ProbabilityVector,
    RankedPrediction,
};
