//! Grade encoding and submission engine.
//!
//! The [`workflows::encoding`] module holds the domain: note values, note records, the
//! validation pipeline, batch encoding, submission and completeness detection. The remaining
//! modules carry the application plumbing shared with the API service.

pub mod config;
pub mod error;
pub mod telemetry;
pub mod workflows;
