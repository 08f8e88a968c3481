use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ModelLoadError {
    #[error("Model file not found: {0:?}")]
    NotFound(PathBuf),
    #[error("Model runtime failed to load the artifact: {0}")]
    Runtime(#[from] ort::Error),
    #[error("Model declares no input tensor")]
    MissingInput,
    #[error("Model declares no output tensor")]
    MissingOutput,
}

#[derive(Error, Debug)]
pub enum PredictionError {
    #[error("Inference failed: {0}")]
    Runtime(#[from] ort::Error),
    #[error("Model produced an empty output tensor")]
    EmptyOutput,
    #[error("Model produced a non-finite probability: {0}")]
    NonFinite(f32),
}
