//! Image scanning
//!
//! - `client`: vision model trait and OpenAI implementation
//! - `normalize`: turns raw model output into detected items
//! - `prompt`: per-inventory-kind instructions

pub mod client;
pub mod normalize;
pub mod prompt;

pub use client::{
    scan_image, ImageSource, OpenAiVisionClient, OpenAiVisionConfig, VisionError, VisionModel,
};
pub use normalize::{normalize_detections, NormalizeError};
pub use prompt::InventoryKind;
