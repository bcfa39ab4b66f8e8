mod config;
mod rules;

pub use config::EncodingConfig;

use chrono::NaiveDate;
use serde::Serialize;

use super::domain::NoteRecord;
use super::note::{NoteError, NoteValue};

/// Proposed change to one record, as submitted by the caller.
#[derive(Debug, Clone, Copy)]
pub struct EncodeAttempt<'a> {
    pub raw_value: &'a str,
    pub email: &'a str,
    pub today: NaiveDate,
    pub withdrawn: bool,
}

/// Side-effect-free admission check for a single encode.
///
/// The structural phase parses the raw token and stops at the first failure. The invariant
/// phase runs every remaining rule so that one item can report several violations at once.
#[derive(Debug, Clone)]
pub struct ValidationPipeline {
    config: EncodingConfig,
}

impl ValidationPipeline {
    pub fn new(config: EncodingConfig) -> Self {
        Self { config }
    }

    pub fn validate(
        &self,
        record: &NoteRecord,
        attempt: &EncodeAttempt<'_>,
    ) -> Result<NoteValue, Vec<NoteViolation>> {
        let value = rules::parse_note(record, attempt.raw_value, &self.config)
            .map_err(|error| vec![NoteViolation::InvalidNote(error)])?;

        let violations: Vec<NoteViolation> = [
            rules::email_matches(record, attempt.email),
            rules::not_submitted(record),
            rules::within_deadline(record, attempt.today),
            rules::still_enrolled(attempt.withdrawn),
        ]
        .into_iter()
        .flatten()
        .collect();

        if violations.is_empty() {
            Ok(value)
        } else {
            Err(violations)
        }
    }

    /// Rules a valued record must pass before it can be submitted.
    pub fn check_submission(&self, record: &NoteRecord, today: NaiveDate) -> Vec<NoteViolation> {
        [
            rules::not_submitted(record),
            rules::within_deadline(record, today),
        ]
        .into_iter()
        .flatten()
        .collect()
    }
}

impl Default for ValidationPipeline {
    fn default() -> Self {
        Self::new(EncodingConfig::default())
    }
}

/// Business rule broken by a single encode or submit request.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum NoteViolation {
    #[error(transparent)]
    InvalidNote(#[from] NoteError),
    #[error("email does not match the student's registered address")]
    EmailMismatch,
    #[error("note has already been submitted")]
    AlreadySubmitted,
    #[error("encoding deadline {deadline} has passed")]
    DeadlinePassed { deadline: NaiveDate },
    #[error("student withdrew from the exam")]
    StudentWithdrawn,
}

impl NoteViolation {
    /// Stable identifier used in API payloads and logs.
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidNote(NoteError::Malformed { .. }) => "note_malformed",
            Self::InvalidNote(NoteError::OutOfRange { .. }) => "note_out_of_range",
            Self::InvalidNote(NoteError::DecimalNotAllowed { .. }) => "decimal_not_allowed",
            Self::EmailMismatch => "email_mismatch",
            Self::AlreadySubmitted => "already_submitted",
            Self::DeadlinePassed { .. } => "deadline_passed",
            Self::StudentWithdrawn => "student_withdrawn",
        }
    }

    pub fn view(&self) -> ViolationView {
        ViolationView {
            code: self.code(),
            message: self.to_string(),
        }
    }
}

/// Serializable form of a violation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ViolationView {
    pub code: &'static str,
    pub message: String,
}
