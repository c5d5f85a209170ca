//! Core domain model for stargazer.
//!
//! This crate defines the Astronomy Picture of the Day entry model, the
//! rover photo record, and the SQLite schema that stores ingested entries.

#![deny(unsafe_code)]
#![warn(missing_debug_implementations)]

pub mod error;
pub mod model;
pub mod schema;

pub use error::{Error, Result};
