use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::note::{NoteError, NoteValue, DEFAULT_DECIMAL_CREDIT_THRESHOLD};
use super::validation::NoteViolation;

/// Student registration number.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Noma(pub String);

/// Learning unit (course) code, e.g. `LDROI1001`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CourseCode(pub String);

/// Registration number of the acting teacher.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TeacherId(pub String);

impl fmt::Display for Noma {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Display for CourseCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Display for TeacherId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One gradable slot: a student, a course, an academic year and an exam session.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NoteRecordIdentity {
    pub noma: Noma,
    pub course_code: CourseCode,
    pub academic_year: u16,
    pub session: u8,
}

impl NoteRecordIdentity {
    pub fn new(
        noma: impl Into<String>,
        course_code: impl Into<String>,
        academic_year: u16,
        session: u8,
    ) -> Self {
        Self {
            noma: Noma(noma.into()),
            course_code: CourseCode(course_code.into()),
            academic_year,
            session,
        }
    }
}

impl fmt::Display for NoteRecordIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{}/{}/session-{}",
            self.noma, self.course_code, self.academic_year, self.session
        )
    }
}

/// Exam-enrollment data produced upstream when a gradable slot is opened.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExamEnrollment {
    pub student_email: String,
    pub cohort_name: String,
    pub credit_weight: f32,
    pub manager_deadline: NaiveDate,
    pub tutor_deadline: NaiveDate,
}

/// Course and cohort pair used to group records for completeness accounting.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct CohortGroup {
    pub course_code: CourseCode,
    pub cohort_name: String,
    pub academic_year: u16,
    pub session: u8,
}

impl fmt::Display for CohortGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ({}) {}/session-{}",
            self.course_code, self.cohort_name, self.academic_year, self.session
        )
    }
}

/// Result of a submit request on a single record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SubmitOutcome {
    Submitted,
    /// The record holds no value; submitting it changes nothing.
    NothingToSubmit,
}

/// Per-student grade aggregate.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NoteRecord {
    identity: NoteRecordIdentity,
    value: NoteValue,
    student_email: String,
    cohort_name: String,
    credit_weight: f32,
    manager_deadline: NaiveDate,
    tutor_deadline: NaiveDate,
    submitted: bool,
}

impl NoteRecord {
    /// Open an empty draft slot for an enrolled student.
    pub fn materialize(
        identity: NoteRecordIdentity,
        enrollment: ExamEnrollment,
    ) -> Result<Self, RecordError> {
        Self::restore(identity, enrollment, NoteValue::Missing, false)
    }

    /// Rebuild a record from storage, re-checking the aggregate invariants.
    pub fn restore(
        identity: NoteRecordIdentity,
        enrollment: ExamEnrollment,
        value: NoteValue,
        submitted: bool,
    ) -> Result<Self, RecordError> {
        let ExamEnrollment {
            student_email,
            cohort_name,
            credit_weight,
            manager_deadline,
            tutor_deadline,
        } = enrollment;

        if tutor_deadline > manager_deadline {
            return Err(RecordError::TutorDeadlineAfterManagerDeadline {
                tutor: tutor_deadline,
                manager: manager_deadline,
            });
        }
        if submitted && !value.is_valued() {
            return Err(RecordError::SubmittedWithoutValue);
        }
        if let NoteValue::Numeric(score) = value {
            if !score.is_integral() && credit_weight < DEFAULT_DECIMAL_CREDIT_THRESHOLD {
                return Err(RecordError::DecimalNotAllowed { credit_weight });
            }
        }

        Ok(Self {
            identity,
            value,
            student_email,
            cohort_name,
            credit_weight,
            manager_deadline,
            tutor_deadline,
            submitted,
        })
    }

    pub fn identity(&self) -> &NoteRecordIdentity {
        &self.identity
    }

    pub fn value(&self) -> &NoteValue {
        &self.value
    }

    pub fn student_email(&self) -> &str {
        &self.student_email
    }

    pub fn cohort_name(&self) -> &str {
        &self.cohort_name
    }

    pub fn credit_weight(&self) -> f32 {
        self.credit_weight
    }

    pub fn manager_deadline(&self) -> NaiveDate {
        self.manager_deadline
    }

    pub fn tutor_deadline(&self) -> NaiveDate {
        self.tutor_deadline
    }

    pub fn is_submitted(&self) -> bool {
        self.submitted
    }

    pub fn group(&self) -> CohortGroup {
        CohortGroup {
            course_code: self.identity.course_code.clone(),
            cohort_name: self.cohort_name.clone(),
            academic_year: self.identity.academic_year,
            session: self.identity.session,
        }
    }

    /// Store a value already admitted by the validation pipeline.
    pub(crate) fn encode(&mut self, value: NoteValue) -> Result<(), NoteViolation> {
        if self.submitted {
            return Err(NoteViolation::AlreadySubmitted);
        }
        if let NoteValue::Numeric(score) = value {
            if !score.is_integral() && self.credit_weight < DEFAULT_DECIMAL_CREDIT_THRESHOLD {
                return Err(NoteViolation::InvalidNote(NoteError::DecimalNotAllowed {
                    raw: value.render(),
                    credit_weight: self.credit_weight,
                }));
            }
        }
        self.value = value;
        Ok(())
    }

    /// Move a valued draft to the submitted state.
    pub fn submit(&mut self) -> Result<SubmitOutcome, NoteViolation> {
        if !self.value.is_valued() {
            return Ok(SubmitOutcome::NothingToSubmit);
        }
        if self.submitted {
            return Err(NoteViolation::AlreadySubmitted);
        }
        self.submitted = true;
        Ok(SubmitOutcome::Submitted)
    }

    pub fn view(&self) -> NoteRecordView {
        NoteRecordView {
            identity: self.identity.clone(),
            cohort_name: self.cohort_name.clone(),
            value: self.value.render(),
            submitted: self.submitted,
            manager_deadline: self.manager_deadline,
            tutor_deadline: self.tutor_deadline,
        }
    }
}

/// Invariant violations detected while building a record.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RecordError {
    #[error("tutor deadline {tutor} falls after manager deadline {manager}")]
    TutorDeadlineAfterManagerDeadline { tutor: NaiveDate, manager: NaiveDate },
    #[error("a submitted record must hold a value")]
    SubmittedWithoutValue,
    #[error("fractional score stored for a course weighing {credit_weight} credits")]
    DecimalNotAllowed { credit_weight: f32 },
}

/// Outward representation of a record for API responses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NoteRecordView {
    #[serde(flatten)]
    pub identity: NoteRecordIdentity,
    pub cohort_name: String,
    pub value: String,
    pub submitted: bool,
    pub manager_deadline: NaiveDate,
    pub tutor_deadline: NaiveDate,
}
