use super::common::*;
use crate::workflows::encoding::deadline::{deadline_reached, is_encodable_on};
use crate::workflows::encoding::note::NoteError;
use crate::workflows::encoding::{
    EncodeAttempt, EncodingConfig, NoteRecord, NoteViolation, ValidationPipeline,
};

fn attempt<'a>(raw_value: &'a str, email: &'a str) -> EncodeAttempt<'a> {
    EncodeAttempt {
        raw_value,
        email,
        today: today(),
        withdrawn: false,
    }
}

#[test]
fn admissible_encode_returns_parsed_value() {
    let record = draft("A001");
    let email = email("A001");
    let value = ValidationPipeline::default()
        .validate(&record, &attempt("12", &email))
        .expect("admissible");
    assert_eq!(value, points(12));
}

#[test]
fn deadline_day_itself_is_still_open() {
    let record = draft("A001");
    let email = email("A001");
    let pipeline = ValidationPipeline::default();

    let on_deadline = EncodeAttempt {
        today: manager_deadline(),
        ..attempt("12", &email)
    };
    assert!(pipeline.validate(&record, &on_deadline).is_ok());

    let day_after = EncodeAttempt {
        today: manager_deadline().succ_opt().expect("valid date"),
        ..attempt("12", &email)
    };
    assert_eq!(
        pipeline.validate(&record, &day_after),
        Err(vec![NoteViolation::DeadlinePassed {
            deadline: manager_deadline()
        }])
    );
}

#[test]
fn structural_failure_short_circuits_invariant_checks() {
    let record = submitted("A001", points(10));
    let result = ValidationPipeline::default().validate(&record, &attempt("abc", "wrong@x.org"));

    match result {
        Err(violations) => {
            assert_eq!(violations.len(), 1);
            assert!(matches!(
                violations[0],
                NoteViolation::InvalidNote(NoteError::Malformed { .. })
            ));
        }
        other => panic!("expected a single malformed violation, got {other:?}"),
    }
}

#[test]
fn invariant_violations_are_reported_together() {
    let record = submitted("A001", points(10));
    let late = EncodeAttempt {
        today: date(2026, 7, 2),
        withdrawn: true,
        ..attempt("12", "someone-else@student.example.edu")
    };

    let violations = ValidationPipeline::default()
        .validate(&record, &late)
        .expect_err("four violations");
    let codes: Vec<_> = violations.iter().map(NoteViolation::code).collect();
    assert_eq!(
        codes,
        vec![
            "email_mismatch",
            "already_submitted",
            "deadline_passed",
            "student_withdrawn"
        ]
    );
}

#[test]
fn decimal_threshold_can_be_raised_but_not_lowered() {
    let email = email("A001");
    let light = NoteRecord::materialize(identity("A001"), enrollment("A001", 12.0))
        .expect("valid record");
    let heavy = NoteRecord::materialize(identity("A001"), enrollment("A001", 15.0))
        .expect("valid record");

    let lowered = ValidationPipeline::new(EncodingConfig {
        decimal_credit_threshold: 10.0,
    });
    match lowered.validate(&light, &attempt("12.5", &email)) {
        Err(violations) => assert!(matches!(
            violations.as_slice(),
            [NoteViolation::InvalidNote(NoteError::DecimalNotAllowed { .. })]
        )),
        other => panic!("expected decimal rejection, got {other:?}"),
    }
    assert_eq!(
        lowered.validate(&heavy, &attempt("12.5", &email)),
        Ok(hundredths(1250))
    );

    let raised = ValidationPipeline::new(EncodingConfig {
        decimal_credit_threshold: 20.0,
    });
    assert!(raised.validate(&heavy, &attempt("12.5", &email)).is_err());
    assert_eq!(
        raised.validate(&heavy, &attempt("12", &email)),
        Ok(points(12))
    );
}

#[test]
fn submission_checks_state_and_deadline() {
    let pipeline = ValidationPipeline::default();
    assert!(pipeline
        .check_submission(&valued("A001", points(12)), today())
        .is_empty());
    assert_eq!(
        pipeline.check_submission(&submitted("A001", points(12)), date(2026, 7, 1)),
        vec![
            NoteViolation::AlreadySubmitted,
            NoteViolation::DeadlinePassed {
                deadline: manager_deadline()
            }
        ]
    );
}

#[test]
fn deadline_policy_is_inclusive() {
    let record = draft("A001");
    assert!(is_encodable_on(&record, manager_deadline()));
    assert!(!is_encodable_on(&record, date(2026, 7, 1)));
    assert!(!deadline_reached(tutor_deadline(), tutor_deadline()));
    assert!(deadline_reached(tutor_deadline(), date(2026, 6, 26)));
}

#[test]
fn violation_codes_are_stable() {
    let malformed = NoteViolation::from(NoteError::Malformed {
        raw: "x".to_string(),
    });
    assert_eq!(malformed.code(), "note_malformed");
    assert_eq!(
        malformed.view().message,
        "note 'x' is neither a score nor a known justification code"
    );
    assert_eq!(NoteViolation::StudentWithdrawn.code(), "student_withdrawn");
}
