//! Error type shared by every stage of the compositing pipeline.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CompositeError {
    #[error("invalid compositing mode '{0}', expected one of: add, overwrite, overwrite_perimeter")]
    InvalidMode(String),

    #[error("unknown palette '{0}', supported: {supported}", supported = crate::palette::SUPPORTED.join(", "))]
    UnknownPalette(String),

    #[error("scaler must be fitted before transform")]
    UnfittedScaler,

    #[error("invalid raster shape: width={width}, height={height}")]
    InvalidShape { width: usize, height: usize },

    #[error("worker count must be at least 1")]
    InvalidWorkerCount,

    #[error("failed to build worker pool: {0}")]
    WorkerPool(#[from] rayon::ThreadPoolBuildError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("image encoding failed: {0}")]
    Image(#[from] image::ImageError),

    #[error("npy encoding failed: {0}")]
    Npy(#[from] ndarray_npy::WriteNpyError),
}

pub type Result<T> = std::result::Result<T, CompositeError>;
