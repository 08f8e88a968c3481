use crate::upload::{UploadError, UploadedImage};
use image::DynamicImage;
use pcos_prediction::{predict, preprocess, ModelLoadError, ModelService, Prediction};
use std::sync::Arc;

pub const PREDICTION_FAILED: &str = "Error during prediction. Please try again.";

#[derive(Debug, Clone, PartialEq)]
pub enum Phase {
    Idle,
    ImageLoaded,
    Analyzing,
    ResultReady(Prediction),
    Failed(String),
}

pub struct LoadedImage {
    pub upload: UploadedImage,
    pub image: DynamicImage,
    pub revision: u64,
}

/// Single-user interaction state: one uploaded image at most, and the outcome
/// of the last analysis.
///
/// When the model failed to load, every event is a no-op and the page only
/// shows the load failure.
pub struct Presenter {
    model: Result<Arc<dyn ModelService>, ModelLoadError>,
    image: Option<LoadedImage>,
    phase: Phase,
    rejection: Option<UploadError>,
    revisions: u64,
}

impl Presenter {
    pub fn new(model: Result<Arc<dyn ModelService>, ModelLoadError>) -> Self {
        Self {
            model,
            image: None,
            phase: Phase::Idle,
            rejection: None,
            revisions: 0,
        }
    }

    pub fn phase(&self) -> &Phase {
        &self.phase
    }

    pub fn image(&self) -> Option<&LoadedImage> {
        self.image.as_ref()
    }

    pub fn rejection(&self) -> Option<&UploadError> {
        self.rejection.as_ref()
    }

    pub fn load_error(&self) -> Option<&ModelLoadError> {
        self.model.as_ref().err()
    }

    pub fn on_upload(&mut self, upload: Result<UploadedImage, UploadError>) {
        if self.model.is_err() {
            return;
        }

        self.image = None;
        self.rejection = None;
        self.phase = Phase::Idle;

        match upload.and_then(|upload| upload.decode().map(|image| (upload, image))) {
            Ok((upload, image)) => {
                self.revisions += 1;
                tracing::info!(
                    file_name = ?upload.file_name,
                    bytes = upload.data.len(),
                    width = image.width(),
                    height = image.height(),
                    "Image loaded"
                );
                self.image = Some(LoadedImage {
                    upload,
                    image,
                    revision: self.revisions,
                });
                self.phase = Phase::ImageLoaded;
            }
            Err(err) => {
                tracing::warn!("Upload rejected: {}", err);
                self.rejection = Some(err);
            }
        }
    }

    pub fn on_analyze(&mut self) {
        let model = match &self.model {
            Ok(model) => Arc::clone(model),
            Err(_) => return,
        };
        let Some(loaded) = &self.image else {
            return;
        };

        self.phase = Phase::Analyzing;
        let input = preprocess(&loaded.image);

        self.phase = match predict(model.as_ref(), &input) {
            Ok(prediction) => Phase::ResultReady(prediction),
            Err(err) => {
                tracing::error!("Prediction failed: {}", err);
                Phase::Failed(err.to_string())
            }
        };
    }

    pub fn on_clear(&mut self) {
        if self.model.is_err() {
            return;
        }

        self.image = None;
        self.rejection = None;
        self.phase = Phase::Idle;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::upload::tests::encoded_rgb;
    use bytes::Bytes;
    use image::ImageFormat;
    use ndarray::Array4;
    use pcos_prediction::{Diagnosis, PredictionError};
    use std::path::PathBuf;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct MockModelService {
        probability: f32,
        calls: AtomicUsize,
    }

    impl MockModelService {
        fn new(probability: f32) -> Arc<Self> {
            Arc::new(Self {
                probability,
                calls: AtomicUsize::new(0),
            })
        }
    }

    impl ModelService for MockModelService {
        fn infer(&self, input: &Array4<f32>) -> Result<f32, PredictionError> {
            assert_eq!(input.shape(), &[1, 224, 224, 3]);
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.probability)
        }
    }

    struct FailingModelService;

    impl ModelService for FailingModelService {
        fn infer(&self, _input: &Array4<f32>) -> Result<f32, PredictionError> {
            Err(PredictionError::EmptyOutput)
        }
    }

    fn png_upload(width: u32, height: u32) -> Result<UploadedImage, UploadError> {
        UploadedImage::new(
            encoded_rgb(width, height, ImageFormat::Png),
            Some("image/png"),
            Some("ovary.png".to_string()),
        )
    }

    fn presenter_with(model: Arc<dyn ModelService>) -> Presenter {
        Presenter::new(Ok(model))
    }

    #[test]
    fn test_starts_idle_and_ignores_trigger_without_image() {
        let model = MockModelService::new(0.2);
        let mut presenter = presenter_with(model.clone());

        presenter.on_analyze();

        assert_eq!(presenter.phase(), &Phase::Idle);
        assert_eq!(model.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_upload_then_analyze_reports_positive() {
        let model = MockModelService::new(0.2);
        let mut presenter = presenter_with(model.clone());

        presenter.on_upload(png_upload(300, 300));
        assert_eq!(presenter.phase(), &Phase::ImageLoaded);

        presenter.on_analyze();

        match presenter.phase() {
            Phase::ResultReady(prediction) => {
                assert_eq!(prediction.diagnosis, Diagnosis::Positive);
                assert_eq!(prediction.diagnosis.to_string(), "PCOS Positive");
                assert_eq!(prediction.confidence_percent(), "60.00%");
            }
            other => panic!("expected a result, got {:?}", other),
        }
        assert_eq!(model.calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_new_trigger_reruns_analysis() {
        let model = MockModelService::new(0.9);
        let mut presenter = presenter_with(model.clone());

        presenter.on_upload(png_upload(64, 64));
        presenter.on_analyze();
        presenter.on_analyze();

        assert!(matches!(presenter.phase(), Phase::ResultReady(p) if p.diagnosis == Diagnosis::Negative));
        assert_eq!(model.calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_corrupt_upload_is_recoverable() {
        let model = MockModelService::new(0.2);
        let mut presenter = presenter_with(model.clone());

        let corrupt = UploadedImage::new(
            Bytes::from_static(b"\x89PNG but not really"),
            Some("image/png"),
            Some("scan.png".to_string()),
        );
        presenter.on_upload(corrupt);

        assert_eq!(presenter.phase(), &Phase::Idle);
        assert!(presenter.image().is_none());
        assert!(matches!(presenter.rejection(), Some(UploadError::Decode(_))));

        presenter.on_analyze();
        assert_eq!(model.calls.load(Ordering::SeqCst), 0);

        presenter.on_upload(png_upload(40, 40));
        assert_eq!(presenter.phase(), &Phase::ImageLoaded);
        assert!(presenter.rejection().is_none());
    }

    #[test]
    fn test_oversize_upload_replaces_loaded_image() {
        let mut presenter = presenter_with(MockModelService::new(0.2));
        presenter.on_upload(png_upload(40, 40));

        presenter.on_upload(Err(UploadError::TooLarge(10_485_761)));

        assert_eq!(presenter.phase(), &Phase::Idle);
        assert!(presenter.image().is_none());
        assert!(matches!(presenter.rejection(), Some(UploadError::TooLarge(_))));
    }

    #[test]
    fn test_prediction_failure_keeps_image_for_retry() {
        let mut presenter = presenter_with(Arc::new(FailingModelService));

        presenter.on_upload(png_upload(50, 80));
        presenter.on_analyze();

        assert!(matches!(presenter.phase(), Phase::Failed(_)));
        assert!(presenter.image().is_some());

        presenter.on_analyze();
        assert!(matches!(presenter.phase(), Phase::Failed(_)));
    }

    #[test]
    fn test_clear_returns_to_idle() {
        let mut presenter = presenter_with(MockModelService::new(0.7));
        presenter.on_upload(png_upload(20, 20));
        presenter.on_analyze();

        presenter.on_clear();

        assert_eq!(presenter.phase(), &Phase::Idle);
        assert!(presenter.image().is_none());
    }

    #[test]
    fn test_revision_increases_per_upload() {
        let mut presenter = presenter_with(MockModelService::new(0.7));

        presenter.on_upload(png_upload(20, 20));
        let first = presenter.image().unwrap().revision;
        presenter.on_upload(png_upload(20, 20));
        let second = presenter.image().unwrap().revision;

        assert!(second > first);
    }

    #[test]
    fn test_missing_model_blocks_every_interaction() {
        let mut presenter = Presenter::new(Err(ModelLoadError::NotFound(PathBuf::from(
            "models/pcos_detection_model.onnx",
        ))));

        presenter.on_upload(png_upload(300, 300));
        assert!(presenter.image().is_none());
        assert_eq!(presenter.phase(), &Phase::Idle);

        presenter.on_analyze();
        assert_eq!(presenter.phase(), &Phase::Idle);

        presenter.on_clear();
        assert!(presenter.load_error().is_some());
    }
}
