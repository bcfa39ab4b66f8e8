use super::common::*;
use crate::workflows::encoding::domain::{CourseCode, NoteRecord};
use crate::workflows::encoding::ProgressSummary;

#[test]
fn progress_groups_by_course_and_tutor_deadline() {
    let mut late = enrollment("C", 5.0);
    late.tutor_deadline = date(2026, 6, 15);
    let records = vec![
        submitted("A", points(12)),
        valued("B", points(8)),
        NoteRecord::restore(identity("C"), late, points(15), true).expect("valid"),
    ];

    let summary = ProgressSummary::from_records(&records, today());
    assert_eq!(summary.courses.len(), 1);

    let course = summary
        .course(&CourseCode(COURSE.to_string()))
        .expect("course present");
    assert_eq!((course.submitted, course.total), (2, 3));
    assert!(!course.complete);

    assert_eq!(course.deadlines.len(), 2);
    let early = &course.deadlines[0];
    assert_eq!(early.deadline, date(2026, 6, 15));
    assert_eq!((early.submitted, early.total), (1, 1));
    assert!(early.reached);

    let regular = &course.deadlines[1];
    assert_eq!(regular.deadline, tutor_deadline());
    assert_eq!((regular.submitted, regular.total), (1, 2));
    assert!(!regular.reached);
}

#[test]
fn course_with_every_note_submitted_is_complete() {
    let records = vec![submitted("A", points(12)), submitted("B", points(3))];
    let summary = ProgressSummary::from_records(&records, today());
    assert!(summary.courses[0].complete);
}

#[test]
fn empty_search_yields_empty_summary() {
    assert_eq!(
        ProgressSummary::from_records(&[], today()),
        ProgressSummary::default()
    );
}
