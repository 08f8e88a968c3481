mod ort_service;

pub mod config;
pub mod error;
pub mod model_service;
pub mod predictor;
pub mod preprocess;

pub use error::{ModelLoadError, PredictionError};
pub use model_service::ModelService;
pub use ort_service::{OrtModelService, TensorDescriptor};
pub use predictor::{predict, Diagnosis, Prediction};
pub use preprocess::preprocess;
