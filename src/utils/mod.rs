//! Shared error and validation helpers

pub mod error;
pub mod validation;

pub use error::{ComError, ComResult};
