use super::common::*;
use crate::workflows::encoding::domain::{NoteRecord, RecordError, SubmitOutcome};
use crate::workflows::encoding::note::{NoteError, NoteValue};
use crate::workflows::encoding::NoteViolation;

#[test]
fn submitting_an_empty_note_is_a_no_op() {
    let mut record = draft("A001");
    assert_eq!(record.submit(), Ok(SubmitOutcome::NothingToSubmit));
    assert!(!record.is_submitted());
}

#[test]
fn second_submit_fails() {
    let mut record = valued("A001", points(14));
    assert_eq!(record.submit(), Ok(SubmitOutcome::Submitted));
    assert!(record.is_submitted());
    assert_eq!(record.submit(), Err(NoteViolation::AlreadySubmitted));
}

#[test]
fn submitted_notes_cannot_be_encoded() {
    let mut record = submitted("A001", points(14));
    assert_eq!(
        record.encode(points(15)),
        Err(NoteViolation::AlreadySubmitted)
    );
    assert_eq!(record.value(), &points(14));
}

#[test]
fn encode_keeps_fractional_scores_off_light_courses() {
    let mut record =
        NoteRecord::materialize(identity("A001"), enrollment("A001", 12.0)).expect("valid record");
    match record.encode(hundredths(1250)) {
        Err(NoteViolation::InvalidNote(NoteError::DecimalNotAllowed { raw, credit_weight })) => {
            assert_eq!(raw, "12.5");
            assert_eq!(credit_weight, 12.0);
        }
        other => panic!("expected decimal rejection, got {other:?}"),
    }
    assert_eq!(record.value(), &NoteValue::Missing);
    assert_eq!(record.encode(points(12)), Ok(()));
}

#[test]
fn materialized_records_start_as_empty_drafts() {
    let record = draft("A001");
    assert_eq!(record.value(), &NoteValue::Missing);
    assert!(!record.is_submitted());
    assert_eq!(record.student_email(), email("A001"));
    assert_eq!(record.group().cohort_name, COHORT);
}

#[test]
fn tutor_deadline_may_not_follow_manager_deadline() {
    let mut enrollment = enrollment("A001", 5.0);
    enrollment.tutor_deadline = date(2026, 7, 5);
    match NoteRecord::materialize(identity("A001"), enrollment) {
        Err(RecordError::TutorDeadlineAfterManagerDeadline { tutor, manager }) => {
            assert_eq!(tutor, date(2026, 7, 5));
            assert_eq!(manager, manager_deadline());
        }
        other => panic!("expected deadline ordering error, got {other:?}"),
    }
}

#[test]
fn restore_rejects_inconsistent_rows() {
    assert_eq!(
        NoteRecord::restore(identity("A001"), enrollment("A001", 5.0), NoteValue::Missing, true),
        Err(RecordError::SubmittedWithoutValue)
    );
    assert!(matches!(
        NoteRecord::restore(identity("A001"), enrollment("A001", 5.0), hundredths(1250), false),
        Err(RecordError::DecimalNotAllowed { .. })
    ));
    assert!(
        NoteRecord::restore(identity("A001"), enrollment("A001", 15.0), hundredths(1250), true)
            .is_ok()
    );
}

#[test]
fn view_renders_the_value() {
    let record =
        NoteRecord::restore(identity("A001"), enrollment("A001", 15.0), hundredths(1250), false)
            .expect("valid record");
    let view = record.view();
    assert_eq!(view.value, "12.5");
    let json = serde_json::to_value(&view).expect("serializable");
    assert_eq!(json["noma"], "A001");
    assert_eq!(json["course_code"], COURSE);
    assert_eq!(json["submitted"], false);
}
