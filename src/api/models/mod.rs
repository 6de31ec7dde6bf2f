//! API request and response models

pub mod todos;

pub use crate::core::error::ErrorResponse;
pub use todos::*;
