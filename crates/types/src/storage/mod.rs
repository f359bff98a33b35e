//! Candidate registry types and traits

pub mod traits;
pub use traits::*;

pub mod errors;
pub use errors::*;

pub type RegistryResult<T> = Result<T, RegistryError>;
