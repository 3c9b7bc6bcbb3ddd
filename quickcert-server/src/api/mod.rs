//! HTTP handlers and their JSON bodies.

pub mod apply;
mod error;
pub mod models;
pub mod sn;

pub use error::ApiError;
