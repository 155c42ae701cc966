//! Rotolog Core - Shared error types and constants

pub mod constants;
mod error;

pub use error::{Error, Result};
