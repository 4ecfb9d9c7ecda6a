//! Ошибки конвейера генерации карты.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum MapError {
    #[error("dataset {} does not exist", path.display())]
    DatasetNotFound { path: PathBuf },
    #[error("failed to read dataset {}", path.display())]
    DatasetRead {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("dataset {} is not a valid GeoJSON FeatureCollection: {reason}", path.display())]
    DatasetMalformed { path: PathBuf, reason: String },
    #[error("feature {feature} is missing required property `{field}`")]
    MissingField { feature: String, field: String },
    #[error("feature {feature}: property `{field}` must be {expected}")]
    InvalidField {
        feature: String,
        field: String,
        expected: &'static str,
    },
    #[error("monthly series must have 12 values, got {len}")]
    InvalidSeriesLength { len: usize },
    #[error("failed to draw chart: {0}")]
    ChartRender(String),
    #[error("failed to encode chart as PNG")]
    Encode(#[source] image::ImageError),
    #[error("failed to serialize map layers")]
    Serialize(#[source] serde_json::Error),
    #[error("failed to write {}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("document {} does not exist", path.display())]
    DocumentNotFound { path: PathBuf },
    #[error("failed to read document {}", path.display())]
    DocumentRead {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("document {} has no <body> element", path.display())]
    MissingBody { path: PathBuf },
}

impl MapError {
    pub(crate) fn missing(feature: &str, field: &str) -> Self {
        Self::MissingField {
            feature: feature.to_string(),
            field: field.to_string(),
        }
    }

    pub(crate) fn invalid(feature: &str, field: &str, expected: &'static str) -> Self {
        Self::InvalidField {
            feature: feature.to_string(),
            field: field.to_string(),
            expected,
        }
    }
}
