use crate::{error::PredictionError, model_service::ModelService};
use ndarray::Array4;
use std::fmt;

/// Probabilities strictly above this value mean no condition was detected.
pub const DECISION_THRESHOLD: f32 = 0.5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Diagnosis {
    Positive,
    Negative,
}

impl Diagnosis {
    pub fn from_probability(probability: f32) -> Self {
        if probability > DECISION_THRESHOLD {
            Diagnosis::Negative
        } else {
            Diagnosis::Positive
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Diagnosis::Positive => "PCOS Positive",
            Diagnosis::Negative => "PCOS Negative",
        }
    }

    pub fn is_detected(&self) -> bool {
        matches!(self, Diagnosis::Positive)
    }
}

impl fmt::Display for Diagnosis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Prediction {
    pub diagnosis: Diagnosis,
    pub probability: f32,
}

impl Prediction {
    pub fn from_probability(probability: f32) -> Self {
        Self {
            diagnosis: Diagnosis::from_probability(probability),
            probability,
        }
    }

    /// Distance from the decision boundary, 0.0 at 0.5 and 1.0 at either end.
    pub fn confidence(&self) -> f32 {
        (self.probability - DECISION_THRESHOLD).abs() * 2.
    }

    pub fn confidence_percent(&self) -> String {
        format!("{:.2}%", self.confidence() * 100.)
    }
}

pub fn predict<M>(model: &M, input: &Array4<f32>) -> Result<Prediction, PredictionError>
where
    M: ModelService + ?Sized,
{
    let probability = model.infer(input)?;
    if !probability.is_finite() {
        return Err(PredictionError::NonFinite(probability));
    }

    let prediction = Prediction::from_probability(probability);
    tracing::info!(
        probability,
        label = %prediction.diagnosis,
        confidence = %prediction.confidence_percent(),
        "Prediction complete"
    );

    Ok(prediction)
}
