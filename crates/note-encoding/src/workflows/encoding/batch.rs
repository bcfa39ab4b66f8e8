use std::collections::HashMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::domain::{NoteRecord, NoteRecordIdentity};
use super::repository::{NoteRepository, RepositoryError, Withdrawals};
use super::validation::{EncodeAttempt, NoteViolation, ValidationPipeline, ViolationView};

/// One line of a batch: who, what value, and the email the caller believes belongs to them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncodeItem {
    #[serde(flatten)]
    pub identity: NoteRecordIdentity,
    #[serde(rename = "value", default)]
    pub raw_value: String,
    pub email: String,
}

impl EncodeItem {
    pub fn new(
        identity: NoteRecordIdentity,
        raw_value: impl Into<String>,
        email: impl Into<String>,
    ) -> Self {
        Self {
            identity,
            raw_value: raw_value.into(),
            email: email.into(),
        }
    }
}

/// Collapse repeated identities, keeping first-seen order and the last value sent.
pub fn dedupe(items: Vec<EncodeItem>) -> Vec<EncodeItem> {
    let mut positions: HashMap<NoteRecordIdentity, usize> = HashMap::new();
    let mut unique: Vec<EncodeItem> = Vec::with_capacity(items.len());
    for item in items {
        match positions.get(&item.identity) {
            Some(&index) => unique[index] = item,
            None => {
                positions.insert(item.identity.clone(), unique.len());
                unique.push(item);
            }
        }
    }
    unique
}

/// Every violation raised for one identity of the batch.
#[derive(Debug, Clone, PartialEq)]
pub struct ItemFailure {
    pub identity: NoteRecordIdentity,
    pub violations: Vec<NoteViolation>,
}

impl ItemFailure {
    pub fn view(&self) -> ItemFailureView {
        ItemFailureView {
            identity: self.identity.clone(),
            violations: self.violations.iter().map(NoteViolation::view).collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ItemFailureView {
    #[serde(flatten)]
    pub identity: NoteRecordIdentity,
    pub violations: Vec<ViolationView>,
}

/// Itemized failure report; `accepted` lists what was persisted despite the failures.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("{} note(s) rejected, {} accepted", .failures.len(), .accepted.len())]
pub struct AggregateValidationError {
    pub accepted: Vec<NoteRecordIdentity>,
    pub failures: Vec<ItemFailure>,
}

impl AggregateValidationError {
    pub fn failure_for(&self, identity: &NoteRecordIdentity) -> Option<&ItemFailure> {
        self.failures
            .iter()
            .find(|failure| &failure.identity == identity)
    }
}

/// Outcome of one batch run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BatchReport {
    pub persisted: Vec<NoteRecord>,
    pub failures: Vec<ItemFailure>,
    pub skipped_not_found: usize,
    pub skipped_unchanged: usize,
}

impl BatchReport {
    pub fn accepted(&self) -> Vec<NoteRecordIdentity> {
        self.persisted
            .iter()
            .map(|record| record.identity().clone())
            .collect()
    }

    pub fn into_result(self) -> Result<Vec<NoteRecordIdentity>, AggregateValidationError> {
        let accepted = self.accepted();
        if self.failures.is_empty() {
            Ok(accepted)
        } else {
            Err(AggregateValidationError {
                accepted,
                failures: self.failures,
            })
        }
    }
}

/// Applies the validation pipeline to many items and persists the admissible changes.
pub struct BatchEncoder {
    pipeline: ValidationPipeline,
}

impl BatchEncoder {
    pub fn new(pipeline: ValidationPipeline) -> Self {
        Self { pipeline }
    }

    /// Saves are independent: a repository failure stops the run but keeps earlier saves.
    pub fn encode<R>(
        &self,
        repository: &R,
        items: Vec<EncodeItem>,
        withdrawals: &Withdrawals,
        today: NaiveDate,
    ) -> Result<BatchReport, RepositoryError>
    where
        R: NoteRepository + ?Sized,
    {
        let mut report = BatchReport::default();
        let mut staged = Vec::new();

        for item in dedupe(items) {
            let Some(mut record) = repository.get(&item.identity)? else {
                tracing::debug!(identity = %item.identity, "note record not found, skipping");
                report.skipped_not_found += 1;
                continue;
            };

            let attempt = EncodeAttempt {
                raw_value: &item.raw_value,
                email: &item.email,
                today,
                withdrawn: withdrawals.contains(&item.identity.noma, &item.identity.course_code),
            };

            let value = match self.pipeline.validate(&record, &attempt) {
                Ok(value) => value,
                Err(violations) => {
                    tracing::debug!(
                        identity = %item.identity,
                        violations = ?violations.iter().map(NoteViolation::code).collect::<Vec<_>>(),
                        "note rejected"
                    );
                    report.failures.push(ItemFailure {
                        identity: item.identity,
                        violations,
                    });
                    continue;
                }
            };

            if *record.value() == value {
                tracing::debug!(identity = %item.identity, "note unchanged, skipping");
                report.skipped_unchanged += 1;
                continue;
            }

            if let Err(violation) = record.encode(value) {
                report.failures.push(ItemFailure {
                    identity: item.identity,
                    violations: vec![violation],
                });
                continue;
            }
            staged.push(record);
        }

        for record in staged {
            repository.save(&record)?;
            report.persisted.push(record);
        }

        Ok(report)
    }
}
