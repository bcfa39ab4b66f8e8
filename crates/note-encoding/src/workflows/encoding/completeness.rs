use std::collections::BTreeMap;

use serde::Serialize;

use super::domain::{CohortGroup, NoteRecord};
use super::repository::Withdrawals;

/// True when every record is valued or belongs to a withdrawn student.
pub fn is_complete(records: &[NoteRecord], withdrawals: &Withdrawals) -> bool {
    records.iter().all(|record| counts_as_graded(record, withdrawals))
}

fn counts_as_graded(record: &NoteRecord, withdrawals: &Withdrawals) -> bool {
    let identity = record.identity();
    record.value().is_valued() || withdrawals.contains(&identity.noma, &identity.course_code)
}

/// Completeness of each (course, cohort) group found in `records`.
pub fn snapshot(records: &[NoteRecord], withdrawals: &Withdrawals) -> BTreeMap<CohortGroup, bool> {
    let mut groups: BTreeMap<CohortGroup, bool> = BTreeMap::new();
    for record in records {
        let graded = counts_as_graded(record, withdrawals);
        groups
            .entry(record.group())
            .and_modify(|complete| *complete &= graded)
            .or_insert(graded);
    }
    groups
}

/// Change in a group's grading status worth telling someone about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GradingTransition {
    FullyGraded,
    Correction,
}

impl GradingTransition {
    /// `changed` says whether any value of the group was actually modified.
    pub fn classify(was_complete: bool, is_complete: bool, changed: bool) -> Option<Self> {
        match (was_complete, is_complete) {
            (false, true) => Some(Self::FullyGraded),
            (true, true) if changed => Some(Self::Correction),
            _ => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::FullyGraded => "fully graded",
            Self::Correction => "correction",
        }
    }
}
