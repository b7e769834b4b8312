use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("bounding box needs at least 3 annotation points, got {found}")]
    InsufficientPoints { found: usize },
    #[error("annotation points are degenerate, convex hull has no area")]
    DegenerateGeometry,
    #[error("invalid bounding box: {0}")]
    InvalidBox(&'static str),
    #[error("annotation missing or unreadable at {path}: {reason}")]
    MissingAnnotation { path: PathBuf, reason: String },
    #[error("image error: {0}")]
    Image(#[from] image::ImageError),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("thread pool error: {0}")]
    ThreadPool(String),
    #[error("no pages could be processed")]
    NoPagesProcessed,
}

pub type Result<T> = std::result::Result<T, Error>;
