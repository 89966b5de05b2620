pub mod repository;

pub use repository::{validate_capture_name, CaptureRepository, JsonFileRepository};
