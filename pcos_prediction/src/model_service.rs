use crate::error::PredictionError;
use ndarray::Array4;

/// A loaded binary classifier.
///
/// `infer` runs one forward pass over a `(1, 224, 224, 3)` tensor and returns
/// the raw probability read from the model's output slot.
pub trait ModelService: Send + Sync + 'static {
    fn infer(&self, input: &Array4<f32>) -> Result<f32, PredictionError>;
}
