use axum::extract::{multipart::MultipartError, Multipart};
use axum::http::StatusCode;
use bytes::{Bytes, BytesMut};
use image::DynamicImage;
use std::io::Cursor;
use thiserror::Error;

/// Largest accepted upload, 10 MiB.
pub const MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

/// Room for multipart boundaries and headers on top of the file itself.
pub const MULTIPART_OVERHEAD_BYTES: usize = 64 * 1024;

pub const UPLOAD_FIELD: &str = "file";

#[derive(Error, Debug)]
pub enum UploadError {
    #[error("File size exceeds 10MB limit. Please upload a smaller file.")]
    TooLarge(usize),
    #[error("Unsupported file type {0:?}. Please upload a JPG or PNG image.")]
    UnsupportedType(String),
    #[error("Error processing image: {0}")]
    Decode(#[from] image::ImageError),
    #[error("No file was selected.")]
    Missing,
    #[error("Failed to read the upload: {0}")]
    Multipart(String),
}

impl UploadError {
    fn from_multipart(err: MultipartError) -> Self {
        if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
            UploadError::TooLarge(MAX_UPLOAD_BYTES + 1)
        } else {
            UploadError::Multipart(err.body_text())
        }
    }

    pub fn hint(&self) -> Option<&'static str> {
        match self {
            UploadError::Decode(_) => Some("Please ensure you've uploaded a valid image file."),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageType {
    Jpeg,
    Png,
}

impl ImageType {
    pub fn mime(&self) -> &'static str {
        match self {
            ImageType::Jpeg => "image/jpeg",
            ImageType::Png => "image/png",
        }
    }

    fn from_mime(mime: &str) -> Option<Self> {
        match mime.trim().to_lowercase().as_str() {
            "image/jpeg" | "image/jpg" | "image/pjpeg" => Some(ImageType::Jpeg),
            "image/png" => Some(ImageType::Png),
            _ => None,
        }
    }

    fn from_file_name(name: &str) -> Option<Self> {
        let (_, extension) = name.rsplit_once('.')?;
        match extension.to_lowercase().as_str() {
            "jpg" | "jpeg" => Some(ImageType::Jpeg),
            "png" => Some(ImageType::Png),
            _ => None,
        }
    }

    /// The declared MIME type wins; the file name extension is the fallback
    /// for clients that send a generic content type.
    pub fn detect(content_type: Option<&str>, file_name: Option<&str>) -> Result<Self, UploadError> {
        content_type
            .and_then(Self::from_mime)
            .or_else(|| file_name.and_then(Self::from_file_name))
            .ok_or_else(|| {
                UploadError::UnsupportedType(
                    content_type
                        .or(file_name)
                        .unwrap_or("unknown")
                        .to_string(),
                )
            })
    }
}

pub fn check_upload_size(size: usize) -> Result<(), UploadError> {
    if size > MAX_UPLOAD_BYTES {
        return Err(UploadError::TooLarge(size));
    }
    Ok(())
}

#[derive(Debug, Clone)]
pub struct UploadedImage {
    pub data: Bytes,
    pub image_type: ImageType,
    pub file_name: Option<String>,
}

impl UploadedImage {
    pub fn new(
        data: Bytes,
        content_type: Option<&str>,
        file_name: Option<String>,
    ) -> Result<Self, UploadError> {
        check_upload_size(data.len())?;
        let image_type = ImageType::detect(content_type, file_name.as_deref())?;

        Ok(Self {
            data,
            image_type,
            file_name,
        })
    }

    pub fn decode(&self) -> Result<DynamicImage, UploadError> {
        let image = image::ImageReader::new(Cursor::new(&self.data))
            .with_guessed_format()
            .map_err(image::ImageError::IoError)?
            .decode()?;

        Ok(image)
    }
}

/// Reads the `file` field of a multipart form, stopping as soon as the
/// running size passes `MAX_UPLOAD_BYTES`.
pub async fn read_upload(mut multipart: Multipart) -> Result<UploadedImage, UploadError> {
    while let Some(mut field) = multipart
        .next_field()
        .await
        .map_err(UploadError::from_multipart)?
    {
        if field.name() != Some(UPLOAD_FIELD) {
            tracing::debug!("Ignoring form field {:?}", field.name());
            continue;
        }

        let file_name = field
            .file_name()
            .filter(|name| !name.is_empty())
            .map(str::to_owned);
        let content_type = field.content_type().map(str::to_owned);

        let mut data = BytesMut::new();
        while let Some(chunk) = field.chunk().await.map_err(UploadError::from_multipart)? {
            let size = data.len() + chunk.len();
            check_upload_size(size)?;
            data.extend_from_slice(&chunk);
        }

        if data.is_empty() && file_name.is_none() {
            return Err(UploadError::Missing);
        }

        return UploadedImage::new(data.freeze(), content_type.as_deref(), file_name);
    }

    Err(UploadError::Missing)
}
