//! BIDS guidelines library exports
//!
//! Audits the metadata of a BIDS dataset against the checklist of a
//! reporting guideline such as COBIDAS.

pub mod catalog;
pub mod config;
pub mod dataset;
pub mod engine;
pub mod error;
pub mod guidelines;
pub mod report;

pub use error::{GuidelineError, Result};
