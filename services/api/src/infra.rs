use chrono::{Datelike, Duration, NaiveDate};
use metrics_exporter_prometheus::PrometheusHandle;
use note_encoding::workflows::encoding::{
    AttributionTranslator, CourseCode, EncodingConfig, EncodingHistory, EncodingPeriod,
    EncodingPeriodProvider, EncodingTranslators, ExamEnrollment, GradingNotification,
    GradingNotifier, Noma, NoteEncodingService, NoteRecord, NoteRecordIdentity, NoteRepository,
    NoteSearchFilters, NotifierError, RecordError, RepositoryError, TeacherId, TranslatorError,
    WithdrawalTranslator, Withdrawals,
};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex};

pub(crate) const DEMO_TEACHER: &str = "T-0042";

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

#[derive(Default, Clone)]
pub(crate) struct InMemoryNoteRepository {
    records: Arc<Mutex<BTreeMap<NoteRecordIdentity, NoteRecord>>>,
}

impl InMemoryNoteRepository {
    pub(crate) fn insert(&self, record: NoteRecord) {
        let mut guard = self.records.lock().expect("repository mutex poisoned");
        guard.insert(record.identity().clone(), record);
    }
}

impl NoteRepository for InMemoryNoteRepository {
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
        let mut guard = self.records.lock().expect("repository mutex poisoned");
        if !guard.contains_key(record.identity()) {
            return Err(RepositoryError::NotFound);
        }
        guard.insert(record.identity().clone(), record.clone());
        Ok(())
    }
}

/// Logs notifications instead of sending e-mails, keeping them for the demo output.
#[derive(Default, Clone)]
pub(crate) struct LoggingNotifier {
    events: Arc<Mutex<Vec<GradingNotification>>>,
}

impl LoggingNotifier {
    pub(crate) fn events(&self) -> Vec<GradingNotification> {
        self.events.lock().expect("notifier mutex poisoned").clone()
    }
}

impl GradingNotifier for LoggingNotifier {
    fn publish(&self, notification: GradingNotification) -> Result<(), NotifierError> {
        tracing::info!(
            group = %notification.group,
            teacher = %notification.teacher,
            transition = notification.transition.label(),
            "grading notification"
        );
        let mut guard = self.events.lock().expect("notifier mutex poisoned");
        guard.push(notification);
        Ok(())
    }
}

/// Stand-in for the registrar's office: encoding period, teaching assignments,
/// withdrawals and the encoding history.
#[derive(Default)]
pub(crate) struct InMemoryRegistrar {
    period: Option<EncodingPeriod>,
    assignments: BTreeSet<(TeacherId, CourseCode, u16)>,
    withdrawals: Withdrawals,
    history: Mutex<Vec<(TeacherId, Vec<NoteRecordIdentity>)>>,
}

impl InMemoryRegistrar {
    pub(crate) fn history_len(&self) -> usize {
        self.history.lock().expect("history mutex poisoned").len()
    }
}

impl EncodingPeriodProvider for InMemoryRegistrar {
    fn current_period(&self) -> Result<Option<EncodingPeriod>, TranslatorError> {
        Ok(self.period.clone())
    }
}

impl AttributionTranslator for InMemoryRegistrar {
    fn is_assigned(
        &self,
        teacher: &TeacherId,
        course_code: &CourseCode,
        academic_year: u16,
    ) -> Result<bool, TranslatorError> {
        Ok(self
            .assignments
            .contains(&(teacher.clone(), course_code.clone(), academic_year)))
    }
}

impl WithdrawalTranslator for InMemoryRegistrar {
    fn search_withdrawn(
        &self,
        course_codes: &[CourseCode],
        _session: u8,
        _academic_year: u16,
    ) -> Result<Withdrawals, TranslatorError> {
        Ok(self.withdrawals.for_courses(course_codes))
    }
}

impl EncodingHistory for InMemoryRegistrar {
    fn record(
        &self,
        teacher: &TeacherId,
        identities: &[NoteRecordIdentity],
    ) -> Result<(), RepositoryError> {
        let mut guard = self.history.lock().expect("history mutex poisoned");
        guard.push((teacher.clone(), identities.to_vec()));
        Ok(())
    }
}

pub(crate) type SeededService = NoteEncodingService<InMemoryNoteRepository, LoggingNotifier>;

/// Seeded campus data wired into a ready-to-use service.
pub(crate) struct Campus {
    pub(crate) service: Arc<SeededService>,
    pub(crate) repository: Arc<InMemoryNoteRepository>,
    pub(crate) notifier: Arc<LoggingNotifier>,
    pub(crate) registrar: Arc<InMemoryRegistrar>,
    pub(crate) academic_year: u16,
    pub(crate) session: u8,
}

struct SeedCourse {
    code: &'static str,
    cohort: &'static str,
    credit_weight: f32,
}

const SEED_COURSES: [SeedCourse; 2] = [
    SeedCourse {
        code: "LDROI1001",
        cohort: "DROI1BA",
        credit_weight: 5.0,
    },
    SeedCourse {
        code: "LECGE1115",
        cohort: "ECGE1BA",
        credit_weight: 15.0,
    },
];

const SEED_STUDENTS: [&str; 4] = ["20210001", "20210002", "20210003", "20210004"];
const SEED_WITHDRAWN: [&str; 1] = ["20210004"];

pub(crate) fn student_email(noma: &str) -> String {
    format!("{noma}@student.example.edu")
}

/// Academic years start in September.
pub(crate) fn academic_year_of(today: NaiveDate) -> u16 {
    let year = if today.month() >= 9 {
        today.year()
    } else {
        today.year() - 1
    };
    u16::try_from(year).unwrap_or_default()
}

pub(crate) fn seed_campus(config: EncodingConfig, today: NaiveDate) -> Result<Campus, RecordError> {
    let academic_year = academic_year_of(today);
    let session = 1;
    let repository = Arc::new(InMemoryNoteRepository::default());

    let teacher = TeacherId(DEMO_TEACHER.to_string());
    let mut assignments = BTreeSet::new();
    let mut withdrawals = Withdrawals::default();
    for course in &SEED_COURSES {
        assignments.insert((teacher.clone(), CourseCode(course.code.to_string()), academic_year));
        for noma in SEED_WITHDRAWN {
            withdrawals.insert(Noma(noma.to_string()), CourseCode(course.code.to_string()));
        }
        for noma in SEED_STUDENTS {
            let record = NoteRecord::materialize(
                NoteRecordIdentity::new(noma, course.code, academic_year, session),
                ExamEnrollment {
                    student_email: student_email(noma),
                    cohort_name: course.cohort.to_string(),
                    credit_weight: course.credit_weight,
                    manager_deadline: today + Duration::days(10),
                    tutor_deadline: today + Duration::days(5),
                },
            )?;
            repository.insert(record);
        }
    }

    let registrar = Arc::new(InMemoryRegistrar {
        period: Some(EncodingPeriod {
            academic_year,
            session,
            opens_on: today - Duration::days(14),
            closes_on: today + Duration::days(30),
        }),
        assignments,
        withdrawals,
        history: Mutex::new(Vec::new()),
    });
    let translators = EncodingTranslators {
        periods: registrar.clone(),
        attributions: registrar.clone(),
        withdrawals: registrar.clone(),
        history: registrar.clone(),
    };

    let notifier = Arc::new(LoggingNotifier::default());
    let service = Arc::new(NoteEncodingService::new(
        repository.clone(),
        notifier.clone(),
        translators,
        config,
    ));

    Ok(Campus {
        service,
        repository,
        notifier,
        registrar,
        academic_year,
        session,
    })
}

pub(crate) fn parse_date(raw: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|err| format!("failed to parse '{raw}' as YYYY-MM-DD ({err})"))
}
