use thiserror::Error;

use crate::device::device_id::Placement;
use crate::train::accumulator::Phase;

/// Every failure the harness can report.
///
/// Configuration problems (`UnsupportedDataset`, `InvalidConfig`) are raised
/// before any device handle or data source exists. Everything else surfaces
/// from inside a run and aborts it; nothing is retried.
#[derive(Debug, Error)]
pub enum MonitorError {
    #[error("unsupported dataset '{0}' (expected one of: cifar10, mnist, pascal)")]
    UnsupportedDataset(String),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("device error: {0}")]
    Device(String),

    #[error("batch is placed on {found} but the model lives on {expected}")]
    DeviceMismatch { expected: Placement, found: Placement },

    #[error("model error: {0}")]
    Model(String),

    #[error("data error: {0}")]
    Data(String),

    #[error("{phase} phase observed zero samples; refusing to average metrics")]
    EmptyPhase { phase: Phase },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Image(#[from] image::ImageError),
}

pub type Result<T> = std::result::Result<T, MonitorError>;
