use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use chrono::NaiveDate;

use super::batch::{
    dedupe, AggregateValidationError, BatchEncoder, BatchReport, EncodeItem, ItemFailure,
};
use super::completeness::{self, GradingTransition};
use super::domain::{CohortGroup, CourseCode, NoteRecordIdentity, SubmitOutcome, TeacherId};
use super::progress::ProgressSummary;
use super::repository::{
    AttributionTranslator, EncodingHistory, EncodingPeriod, EncodingPeriodProvider,
    GradingNotification, GradingNotifier, NoteRepository, NoteSearchFilters, NotifierError,
    RepositoryError, TranslatorError, WithdrawalTranslator, Withdrawals,
};
use super::validation::{EncodingConfig, ValidationPipeline};

/// Lookups into the neighbouring contexts the service depends on.
#[derive(Clone)]
pub struct EncodingTranslators {
    pub periods: Arc<dyn EncodingPeriodProvider>,
    pub attributions: Arc<dyn AttributionTranslator>,
    pub withdrawals: Arc<dyn WithdrawalTranslator>,
    pub history: Arc<dyn EncodingHistory>,
}

/// Service composing the validation pipeline, batch encoder, repository and notifier.
pub struct NoteEncodingService<R, N> {
    repository: Arc<R>,
    notifier: Arc<N>,
    translators: EncodingTranslators,
    pipeline: ValidationPipeline,
    encoder: BatchEncoder,
}

impl<R, N> NoteEncodingService<R, N>
where
    R: NoteRepository + 'static,
    N: GradingNotifier + 'static,
{
    pub fn new(
        repository: Arc<R>,
        notifier: Arc<N>,
        translators: EncodingTranslators,
        config: EncodingConfig,
    ) -> Self {
        let pipeline = ValidationPipeline::new(config);
        let encoder = BatchEncoder::new(pipeline.clone());
        Self {
            repository,
            notifier,
            translators,
            pipeline,
            encoder,
        }
    }

    /// Encode a batch of notes on behalf of `teacher`.
    ///
    /// Returns the identities actually persisted. Per-item failures come back as
    /// [`EncodingServiceError::Validation`] after the admissible items have been saved.
    pub fn encode_batch(
        &self,
        teacher: &TeacherId,
        items: Vec<EncodeItem>,
        today: NaiveDate,
    ) -> Result<Vec<NoteRecordIdentity>, EncodingServiceError> {
        tracing::info!(teacher = %teacher, items = items.len(), "encoding note batch");

        let period = self.open_period(today)?;
        let (items, outside_period): (Vec<EncodeItem>, Vec<EncodeItem>) = dedupe(items)
            .into_iter()
            .partition(|item| period.covers(&item.identity));
        for item in &outside_period {
            tracing::debug!(
                identity = %item.identity,
                academic_year = period.academic_year,
                session = period.session,
                "note outside the open session, skipping"
            );
        }
        self.ensure_assigned(teacher, items.iter().map(|item| &item.identity))?;

        let course_codes = distinct_courses(items.iter().map(|item| &item.identity));
        let withdrawals = self.translators.withdrawals.search_withdrawn(
            &course_codes,
            period.session,
            period.academic_year,
        )?;

        let filters = NoteSearchFilters::for_courses(course_codes);
        let before = completeness::snapshot(&self.repository.search(&filters)?, &withdrawals);

        let mut report = self
            .encoder
            .encode(self.repository.as_ref(), items, &withdrawals, today)?;
        report.skipped_not_found += outside_period.len();

        tracing::info!(
            teacher = %teacher,
            persisted = report.persisted.len(),
            rejected = report.failures.len(),
            skipped_not_found = report.skipped_not_found,
            skipped_unchanged = report.skipped_unchanged,
            "note batch processed"
        );

        if !report.persisted.is_empty() {
            self.after_persist(teacher, &report, &filters, &withdrawals, &before);
        }

        Ok(report.into_result()?)
    }

    /// History and notifications follow persisted notes; their failures are logged only.
    fn after_persist(
        &self,
        teacher: &TeacherId,
        report: &BatchReport,
        filters: &NoteSearchFilters,
        withdrawals: &Withdrawals,
        before: &BTreeMap<CohortGroup, bool>,
    ) {
        if let Err(error) = self.translators.history.record(teacher, &report.accepted()) {
            tracing::warn!(teacher = %teacher, %error, "failed to record encoding history");
        }

        let after = match self.repository.search(filters) {
            Ok(records) => completeness::snapshot(&records, withdrawals),
            Err(error) => {
                tracing::warn!(%error, "failed to reload notes, grading notifications skipped");
                return;
            }
        };
        let touched: BTreeSet<CohortGroup> =
            report.persisted.iter().map(|record| record.group()).collect();
        if let Err(error) = self.notify_transitions(teacher, &touched, before, &after) {
            tracing::warn!(teacher = %teacher, %error, "failed to publish grading notification");
        }
    }

    /// Submit a single note.
    pub fn submit(
        &self,
        teacher: &TeacherId,
        identity: &NoteRecordIdentity,
        today: NaiveDate,
    ) -> Result<SubmitOutcome, EncodingServiceError> {
        self.ensure_assigned(teacher, std::iter::once(identity))?;

        let mut record = self
            .repository
            .get(identity)?
            .ok_or_else(|| EncodingServiceError::NoteNotFound(identity.clone()))?;

        if !record.value().is_valued() {
            return Ok(SubmitOutcome::NothingToSubmit);
        }

        let mut violations = self.pipeline.check_submission(&record, today);
        if violations.is_empty() {
            match record.submit() {
                Ok(outcome) => {
                    self.repository.save(&record)?;
                    tracing::info!(teacher = %teacher, identity = %identity, "note submitted");
                    return Ok(outcome);
                }
                Err(violation) => violations.push(violation),
            }
        }

        Err(AggregateValidationError {
            accepted: Vec::new(),
            failures: vec![ItemFailure {
                identity: identity.clone(),
                violations,
            }],
        }
        .into())
    }

    /// Submit several notes with the batch encoder's partial-failure semantics.
    ///
    /// Unknown identities and empty notes are skipped; the result lists the submitted ones.
    pub fn submit_many(
        &self,
        teacher: &TeacherId,
        identities: Vec<NoteRecordIdentity>,
        today: NaiveDate,
    ) -> Result<Vec<NoteRecordIdentity>, EncodingServiceError> {
        let identities: Vec<NoteRecordIdentity> = identities
            .into_iter()
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        self.ensure_assigned(teacher, identities.iter())?;

        let mut staged = Vec::new();
        let mut failures = Vec::new();
        for identity in identities {
            let Some(mut record) = self.repository.get(&identity)? else {
                tracing::debug!(identity = %identity, "note record not found, skipping");
                continue;
            };
            if !record.value().is_valued() {
                continue;
            }

            let mut violations = self.pipeline.check_submission(&record, today);
            if violations.is_empty() {
                if let Err(violation) = record.submit() {
                    violations.push(violation);
                }
            }
            if violations.is_empty() {
                staged.push(record);
            } else {
                failures.push(ItemFailure {
                    identity,
                    violations,
                });
            }
        }

        let mut accepted = Vec::with_capacity(staged.len());
        for record in staged {
            self.repository.save(&record)?;
            accepted.push(record.identity().clone());
        }

        tracing::info!(
            teacher = %teacher,
            submitted = accepted.len(),
            rejected = failures.len(),
            "note submission processed"
        );

        if failures.is_empty() {
            Ok(accepted)
        } else {
            Err(AggregateValidationError { accepted, failures }.into())
        }
    }

    /// Submission progress of the notes matching `filters`.
    pub fn search_progress(
        &self,
        filters: &NoteSearchFilters,
        today: NaiveDate,
    ) -> Result<ProgressSummary, EncodingServiceError> {
        let records = self.repository.search(filters)?;
        Ok(ProgressSummary::from_records(&records, today))
    }

    fn open_period(&self, today: NaiveDate) -> Result<EncodingPeriod, EncodingServiceError> {
        match self.translators.periods.current_period()? {
            Some(period) if period.is_open_on(today) => Ok(period),
            _ => {
                tracing::warn!(%today, "note encoding rejected: no open encoding period");
                Err(EncodingServiceError::EncodingPeriodClosed)
            }
        }
    }

    fn ensure_assigned<'a>(
        &self,
        teacher: &TeacherId,
        identities: impl Iterator<Item = &'a NoteRecordIdentity>,
    ) -> Result<(), EncodingServiceError> {
        let courses: BTreeSet<(&CourseCode, u16)> = identities
            .map(|identity| (&identity.course_code, identity.academic_year))
            .collect();

        for (course_code, academic_year) in courses {
            if !self
                .translators
                .attributions
                .is_assigned(teacher, course_code, academic_year)?
            {
                tracing::warn!(
                    teacher = %teacher,
                    course = %course_code,
                    academic_year,
                    "teacher is not assigned to course"
                );
                return Err(EncodingServiceError::TeacherNotAssigned {
                    teacher: teacher.clone(),
                    course_code: course_code.clone(),
                });
            }
        }
        Ok(())
    }

    fn notify_transitions(
        &self,
        teacher: &TeacherId,
        touched: &BTreeSet<CohortGroup>,
        before: &BTreeMap<CohortGroup, bool>,
        after: &BTreeMap<CohortGroup, bool>,
    ) -> Result<(), EncodingServiceError> {
        for group in touched {
            let was_complete = before.get(group).copied().unwrap_or(false);
            let is_complete = after.get(group).copied().unwrap_or(false);
            let Some(transition) = GradingTransition::classify(was_complete, is_complete, true)
            else {
                continue;
            };

            tracing::info!(group = %group, transition = transition.label(), "publishing grading notification");
            self.notifier.publish(GradingNotification {
                transition,
                group: group.clone(),
                teacher: teacher.clone(),
            })?;
        }
        Ok(())
    }
}

fn distinct_courses<'a>(
    identities: impl Iterator<Item = &'a NoteRecordIdentity>,
) -> Vec<CourseCode> {
    identities
        .map(|identity| identity.course_code.clone())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Error raised by the note encoding service.
#[derive(Debug, thiserror::Error)]
pub enum EncodingServiceError {
    #[error("no encoding period is currently open")]
    EncodingPeriodClosed,
    #[error("teacher {teacher} is not assigned to course {course_code}")]
    TeacherNotAssigned {
        teacher: TeacherId,
        course_code: CourseCode,
    },
    #[error("note {0} not found")]
    NoteNotFound(NoteRecordIdentity),
    #[error(transparent)]
    Validation(#[from] AggregateValidationError),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
    #[error(transparent)]
    Translator(#[from] TranslatorError),
    #[error(transparent)]
    Notification(#[from] NotifierError),
}
