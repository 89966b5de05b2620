pub mod config;
pub mod error;
pub mod pipeline;

pub use config::Configuration;
pub use error::{AnalysisError, AnalysisResult};
pub use pipeline::AnalysisPipeline;
