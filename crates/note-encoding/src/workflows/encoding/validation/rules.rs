use chrono::NaiveDate;

use super::super::deadline::is_encodable_on;
use super::super::domain::NoteRecord;
use super::super::note::{NoteError, NoteValue};
use super::config::EncodingConfig;
use super::NoteViolation;

pub(crate) fn parse_note(
    record: &NoteRecord,
    raw_value: &str,
    config: &EncodingConfig,
) -> Result<NoteValue, NoteError> {
    NoteValue::parse_with_threshold(
        raw_value,
        record.credit_weight(),
        config.decimal_threshold(),
    )
}

pub(crate) fn email_matches(record: &NoteRecord, email: &str) -> Option<NoteViolation> {
    (record.student_email() != email).then_some(NoteViolation::EmailMismatch)
}

pub(crate) fn not_submitted(record: &NoteRecord) -> Option<NoteViolation> {
    record
        .is_submitted()
        .then_some(NoteViolation::AlreadySubmitted)
}

pub(crate) fn within_deadline(record: &NoteRecord, today: NaiveDate) -> Option<NoteViolation> {
    (!is_encodable_on(record, today)).then_some(NoteViolation::DeadlinePassed {
        deadline: record.manager_deadline(),
    })
}

pub(crate) fn still_enrolled(withdrawn: bool) -> Option<NoteViolation> {
    withdrawn.then_some(NoteViolation::StudentWithdrawn)
}
