// Utility functions
pub mod error;
pub mod token;
pub mod validation;

pub use error::*;
