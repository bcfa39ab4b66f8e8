use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Arc, Mutex};

use axum::response::Response;
use chrono::NaiveDate;
use serde_json::Value;

use crate::workflows::encoding::domain::{
    CourseCode, ExamEnrollment, Noma, NoteRecord, NoteRecordIdentity, TeacherId,
};
use crate::workflows::encoding::note::{NoteValue, Score};
use crate::workflows::encoding::repository::{
    AttributionTranslator, EncodingHistory, EncodingPeriod, EncodingPeriodProvider,
    GradingNotification, GradingNotifier, NoteRepository, NoteSearchFilters, NotifierError,
    RepositoryError, TranslatorError, WithdrawalTranslator, Withdrawals,
};
use crate::workflows::encoding::{EncodingConfig, EncodingTranslators, NoteEncodingService};

pub(super) const COURSE: &str = "LDROI1001";
pub(super) const COHORT: &str = "DROI1BA";
pub(super) const YEAR: u16 = 2025;
pub(super) const SESSION: u8 = 2;

pub(super) fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).expect("valid date")
}

pub(super) fn today() -> NaiveDate {
    date(2026, 6, 20)
}

pub(super) fn manager_deadline() -> NaiveDate {
    date(2026, 6, 30)
}

pub(super) fn tutor_deadline() -> NaiveDate {
    date(2026, 6, 25)
}

pub(super) fn teacher() -> TeacherId {
    TeacherId("T-0042".to_string())
}

pub(super) fn identity(noma: &str) -> NoteRecordIdentity {
    NoteRecordIdentity::new(noma, COURSE, YEAR, SESSION)
}

pub(super) fn email(noma: &str) -> String {
    format!("{noma}@student.example.edu")
}

pub(super) fn enrollment(noma: &str, credit_weight: f32) -> ExamEnrollment {
    ExamEnrollment {
        student_email: email(noma),
        cohort_name: COHORT.to_string(),
        credit_weight,
        manager_deadline: manager_deadline(),
        tutor_deadline: tutor_deadline(),
    }
}

pub(super) fn draft(noma: &str) -> NoteRecord {
    NoteRecord::materialize(identity(noma), enrollment(noma, 5.0)).expect("valid record")
}

pub(super) fn valued(noma: &str, value: NoteValue) -> NoteRecord {
    NoteRecord::restore(identity(noma), enrollment(noma, 5.0), value, false)
        .expect("valid record")
}

pub(super) fn submitted(noma: &str, value: NoteValue) -> NoteRecord {
    NoteRecord::restore(identity(noma), enrollment(noma, 5.0), value, true)
        .expect("valid record")
}

pub(super) fn points(points: u16) -> NoteValue {
    NoteValue::Numeric(Score::from_points(points).expect("score within range"))
}

pub(super) fn hundredths(hundredths: u16) -> NoteValue {
    NoteValue::Numeric(Score::from_hundredths(hundredths).expect("score within range"))
}

pub(super) fn open_period() -> EncodingPeriod {
    EncodingPeriod {
        academic_year: YEAR,
        session: SESSION,
        opens_on: date(2026, 6, 1),
        closes_on: date(2026, 7, 15),
    }
}

#[derive(Default)]
pub(super) struct MemoryRepository {
    records: Mutex<BTreeMap<NoteRecordIdentity, NoteRecord>>,
    failing_save: Mutex<Option<NoteRecordIdentity>>,
    saves: Mutex<Vec<NoteRecordIdentity>>,
}

impl MemoryRepository {
    pub(super) fn with_records(records: impl IntoIterator<Item = NoteRecord>) -> Self {
        let repository = Self::default();
        {
            let mut guard = repository.records.lock().expect("repository mutex poisoned");
            for record in records {
                guard.insert(record.identity().clone(), record);
            }
        }
        repository
    }

    pub(super) fn fail_save_of(&self, identity: NoteRecordIdentity) {
        *self.failing_save.lock().expect("repository mutex poisoned") = Some(identity);
    }

    pub(super) fn stored(&self, identity: &NoteRecordIdentity) -> NoteRecord {
        self.records
            .lock()
            .expect("repository mutex poisoned")
            .get(identity)
            .cloned()
            .expect("record present")
    }

    pub(super) fn saves(&self) -> Vec<NoteRecordIdentity> {
        self.saves.lock().expect("repository mutex poisoned").clone()
    }
}

impl NoteRepository for MemoryRepository {
    fn get(&self, identity: &NoteRecordIdentity) -> Result<Option<NoteRecord>, RepositoryError> {
        let guard = self.records.lock().expect("repository mutex poisoned");
        Ok(guard.get(identity).cloned())
    }

    fn search(&self, filters: &NoteSearchFilters) -> Result<Vec<NoteRecord>, RepositoryError> {
        let guard = self.records.lock().expect("repository mutex poisoned");
        Ok(guard
            .values()
            .filter(|record| filters.matches(record))
            .cloned()
            .collect())
    }

    fn save(&self, record: &NoteRecord) -> Result<(), RepositoryError> {
        let failing = self.failing_save.lock().expect("repository mutex poisoned");
        if failing.as_ref() == Some(record.identity()) {
            return Err(RepositoryError::Unavailable("disk full".to_string()));
        }
        self.records
            .lock()
            .expect("repository mutex poisoned")
            .insert(record.identity().clone(), record.clone());
        self.saves
            .lock()
            .expect("repository mutex poisoned")
            .push(record.identity().clone());
        Ok(())
    }
}

pub(super) struct UnavailableRepository;

impl NoteRepository for UnavailableRepository {
    fn get(&self, _identity: &NoteRecordIdentity) -> Result<Option<NoteRecord>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn search(&self, _filters: &NoteSearchFilters) -> Result<Vec<NoteRecord>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn save(&self, _record: &NoteRecord) -> Result<(), RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }
}

#[derive(Default)]
pub(super) struct MemoryNotifier {
    events: Mutex<Vec<GradingNotification>>,
}

impl MemoryNotifier {
    pub(super) fn events(&self) -> Vec<GradingNotification> {
        self.events.lock().expect("notifier mutex poisoned").clone()
    }
}

impl GradingNotifier for MemoryNotifier {
    fn publish(&self, notification: GradingNotification) -> Result<(), NotifierError> {
        self.events
            .lock()
            .expect("notifier mutex poisoned")
            .push(notification);
        Ok(())
    }
}

pub(super) struct FailingNotifier;

impl GradingNotifier for FailingNotifier {
    fn publish(&self, _notification: GradingNotification) -> Result<(), NotifierError> {
        Err(NotifierError::Transport("smtp down".to_string()))
    }
}

pub(super) struct FixedPeriod(pub(super) Option<EncodingPeriod>);

impl EncodingPeriodProvider for FixedPeriod {
    fn current_period(&self) -> Result<Option<EncodingPeriod>, TranslatorError> {
        Ok(self.0.clone())
    }
}

pub(super) struct StaticAttributions(pub(super) BTreeSet<(TeacherId, CourseCode)>);

impl AttributionTranslator for StaticAttributions {
    fn is_assigned(
        &self,
        teacher: &TeacherId,
        course_code: &CourseCode,
        _academic_year: u16,
    ) -> Result<bool, TranslatorError> {
        Ok(self.0.contains(&(teacher.clone(), course_code.clone())))
    }
}

pub(super) struct StaticWithdrawals(pub(super) Withdrawals);

impl WithdrawalTranslator for StaticWithdrawals {
    fn search_withdrawn(
        &self,
        _course_codes: &[CourseCode],
        _session: u8,
        _academic_year: u16,
    ) -> Result<Withdrawals, TranslatorError> {
        Ok(self.0.clone())
    }
}

#[derive(Default)]
pub(super) struct MemoryHistory {
    entries: Mutex<Vec<(TeacherId, Vec<NoteRecordIdentity>)>>,
}

impl MemoryHistory {
    pub(super) fn entries(&self) -> Vec<(TeacherId, Vec<NoteRecordIdentity>)> {
        self.entries.lock().expect("history mutex poisoned").clone()
    }
}

impl EncodingHistory for MemoryHistory {
    fn record(
        &self,
        teacher: &TeacherId,
        identities: &[NoteRecordIdentity],
    ) -> Result<(), RepositoryError> {
        self.entries
            .lock()
            .expect("history mutex poisoned")
            .push((teacher.clone(), identities.to_vec()));
        Ok(())
    }
}

pub(super) fn withdrawn(nomas: &[&str]) -> Withdrawals {
    nomas
        .iter()
        .map(|noma| (Noma(noma.to_string()), CourseCode(COURSE.to_string())))
        .collect()
}

pub(super) struct Harness {
    pub(super) service: NoteEncodingService<MemoryRepository, MemoryNotifier>,
    pub(super) repository: Arc<MemoryRepository>,
    pub(super) notifier: Arc<MemoryNotifier>,
    pub(super) history: Arc<MemoryHistory>,
}

pub(super) fn harness(records: Vec<NoteRecord>) -> Harness {
    harness_with(records, Some(open_period()), Withdrawals::default())
}

pub(super) fn harness_with(
    records: Vec<NoteRecord>,
    period: Option<EncodingPeriod>,
    withdrawals: Withdrawals,
) -> Harness {
    let repository = Arc::new(MemoryRepository::with_records(records));
    let notifier = Arc::new(MemoryNotifier::default());
    let history = Arc::new(MemoryHistory::default());
    let service = NoteEncodingService::new(
        repository.clone(),
        notifier.clone(),
        translators(period, withdrawals, history.clone()),
        EncodingConfig::default(),
    );
    Harness {
        service,
        repository,
        notifier,
        history,
    }
}

pub(super) fn translators(
    period: Option<EncodingPeriod>,
    withdrawals: Withdrawals,
    history: Arc<MemoryHistory>,
) -> EncodingTranslators {
    let mut assignments = BTreeSet::new();
    assignments.insert((teacher(), CourseCode(COURSE.to_string())));
    EncodingTranslators {
        periods: Arc::new(FixedPeriod(period)),
        attributions: Arc::new(StaticAttributions(assignments)),
        withdrawals: Arc::new(StaticWithdrawals(withdrawals)),
        history,
    }
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}
