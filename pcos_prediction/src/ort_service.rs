use crate::{
    config::ModelConfig,
    error::{ModelLoadError, PredictionError},
    model_service::ModelService,
};
use ndarray::Array4;
use ort::{
    session::{builder::GraphOptimizationLevel, Session},
    value::{TensorRef, ValueType},
};
use parking_lot::Mutex;
use std::path::Path;

/// Name and type of a tensor in the model signature.
#[derive(Debug, Clone)]
pub struct TensorDescriptor {
    pub name: String,
    pub value_type: ValueType,
}

pub struct OrtModelService {
    session: Mutex<Session>,
    input: TensorDescriptor,
    output: TensorDescriptor,
}

fn build_session(path: &Path, intra_threads: usize) -> Result<Session, ort::Error> {
    let session = Session::builder()?
        .with_optimization_level(GraphOptimizationLevel::Level3)?
        .with_intra_threads(intra_threads)?
        .commit_from_file(path)?;
    Ok(session)
}

impl OrtModelService {
    pub fn new(model_config: &ModelConfig) -> Result<Self, ModelLoadError> {
        model_config.validate()?;
        let path = model_config.get_path();

        tracing::info!("Loading model from {:?}", path);
        let session = build_session(&path, model_config.intra_threads)?;

        let input = session
            .inputs
            .first()
            .map(|input| TensorDescriptor {
                name: input.name.clone(),
                value_type: input.input_type.clone(),
            })
            .ok_or(ModelLoadError::MissingInput)?;

        let output = session
            .outputs
            .first()
            .map(|output| TensorDescriptor {
                name: output.name.clone(),
                value_type: output.output_type.clone(),
            })
            .ok_or(ModelLoadError::MissingOutput)?;

        tracing::info!(
            input = %input.name,
            input_type = ?input.value_type,
            output = %output.name,
            output_type = ?output.value_type,
            "Model loaded with {} threads",
            model_config.intra_threads
        );

        Ok(Self {
            session: Mutex::new(session),
            input,
            output,
        })
    }
}

impl ModelService for OrtModelService {
    fn infer(&self, input: &Array4<f32>) -> Result<f32, PredictionError> {
        let input = input.as_standard_layout();
        let tensor_ref = TensorRef::from_array_view(input.view())?;

        let mut session = self.session.lock();
        let outputs = session.run(ort::inputs![self.input.name.as_str() => tensor_ref])?;

        let scores = outputs[self.output.name.as_str()].try_extract_array::<f32>()?;
        let probability = scores.iter().next().copied();

        probability.ok_or(PredictionError::EmptyOutput)
    }
}
