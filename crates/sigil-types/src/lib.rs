//! Shared domain types for the Sigil project.

pub mod artifact;
pub mod config;
pub mod events;
pub mod raster;
pub mod sheet;

mod errors;

pub use errors::{Result, SigilError};
