use std::path::PathBuf;
use thiserror::Error;

/// Failures raised by a [`Segmenter`](crate::segmentation::Segmenter).
#[derive(Error, Debug)]
pub enum SegmentationError {
    #[error(
        "trimap is {trimap_width}x{trimap_height} but image is {image_width}x{image_height}"
    )]
    DimensionMismatch {
        image_width: u32,
        image_height: u32,
        trimap_width: u32,
        trimap_height: u32,
    },

    #[error("seed rectangle does not overlap the image")]
    EmptyRegion,

    #[error("no {class} pixels to fit a colour model")]
    MissingSamples { class: &'static str },
}

#[derive(Error, Debug)]
pub enum SessionError {
    #[error("failed to load image from {}", path.display())]
    ImageLoad {
        path: PathBuf,
        source: image::ImageError,
    },

    #[error("failed to export matte to {}", path.display())]
    Export {
        path: PathBuf,
        source: image::ImageError,
    },

    #[error(transparent)]
    Segmentation(#[from] SegmentationError),

    #[error(transparent)]
    Output(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, SessionError>;
