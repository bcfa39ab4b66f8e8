use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::Serialize;

use super::deadline::deadline_reached;
use super::domain::{CourseCode, NoteRecord};

/// Submission progress per course, for the teacher's overview page.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ProgressSummary {
    pub courses: Vec<CourseProgress>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CourseProgress {
    pub course_code: CourseCode,
    pub academic_year: u16,
    pub session: u8,
    pub submitted: usize,
    pub total: usize,
    /// Every note of the course has been submitted.
    pub complete: bool,
    pub deadlines: Vec<DeadlineProgress>,
}

/// Counts for the students sharing one tutor deadline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeadlineProgress {
    pub deadline: NaiveDate,
    pub submitted: usize,
    pub total: usize,
    pub reached: bool,
}

#[derive(Default)]
struct Tally {
    submitted: usize,
    total: usize,
}

impl Tally {
    fn add(&mut self, record: &NoteRecord) {
        self.total += 1;
        if record.is_submitted() {
            self.submitted += 1;
        }
    }
}

impl ProgressSummary {
    pub fn from_records(records: &[NoteRecord], today: NaiveDate) -> Self {
        let mut courses: BTreeMap<(CourseCode, u16, u8), BTreeMap<NaiveDate, Tally>> =
            BTreeMap::new();
        for record in records {
            let identity = record.identity();
            courses
                .entry((
                    identity.course_code.clone(),
                    identity.academic_year,
                    identity.session,
                ))
                .or_default()
                .entry(record.tutor_deadline())
                .or_default()
                .add(record);
        }

        let courses = courses
            .into_iter()
            .map(|((course_code, academic_year, session), by_deadline)| {
                let deadlines: Vec<DeadlineProgress> = by_deadline
                    .into_iter()
                    .map(|(deadline, tally)| DeadlineProgress {
                        deadline,
                        submitted: tally.submitted,
                        total: tally.total,
                        reached: deadline_reached(deadline, today),
                    })
                    .collect();
                let submitted = deadlines.iter().map(|entry| entry.submitted).sum();
                let total = deadlines.iter().map(|entry| entry.total).sum();
                CourseProgress {
                    course_code,
                    academic_year,
                    session,
                    submitted,
                    total,
                    complete: submitted == total,
                    deadlines,
                }
            })
            .collect();

        Self { courses }
    }

    pub fn course(&self, course_code: &CourseCode) -> Option<&CourseProgress> {
        self.courses
            .iter()
            .find(|course| &course.course_code == course_code)
    }
}
