use std::collections::BTreeSet;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::completeness::GradingTransition;
use super::domain::{CohortGroup, CourseCode, Noma, NoteRecord, NoteRecordIdentity, TeacherId};

/// Storage abstraction so the service module can be exercised in isolation.
pub trait NoteRepository: Send + Sync {
    fn get(&self, identity: &NoteRecordIdentity) -> Result<Option<NoteRecord>, RepositoryError>;
    fn search(&self, filters: &NoteSearchFilters) -> Result<Vec<NoteRecord>, RepositoryError>;
    fn save(&self, record: &NoteRecord) -> Result<(), RepositoryError>;
}

/// Criteria for [`NoteRepository::search`]; unset fields match everything.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NoteSearchFilters {
    #[serde(default)]
    pub course_codes: Vec<CourseCode>,
    pub academic_year: Option<u16>,
    pub session: Option<u8>,
    pub cohort_name: Option<String>,
}

impl NoteSearchFilters {
    pub fn for_courses(course_codes: impl IntoIterator<Item = CourseCode>) -> Self {
        Self {
            course_codes: course_codes.into_iter().collect(),
            ..Self::default()
        }
    }

    pub fn matches(&self, record: &NoteRecord) -> bool {
        let identity = record.identity();
        (self.course_codes.is_empty() || self.course_codes.contains(&identity.course_code))
            && self
                .academic_year
                .map_or(true, |year| identity.academic_year == year)
            && self.session.map_or(true, |session| identity.session == session)
            && self
                .cohort_name
                .as_deref()
                .map_or(true, |cohort| record.cohort_name() == cohort)
    }
}

/// Error enumeration for repository failures.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("record not found")]
    NotFound,
    #[error("repository unavailable: {0}")]
    Unavailable(String),
}

/// Students who cancelled their exam enrollment, keyed by course.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Withdrawals(BTreeSet<(Noma, CourseCode)>);

impl Withdrawals {
    pub fn insert(&mut self, noma: Noma, course_code: CourseCode) {
        self.0.insert((noma, course_code));
    }

    pub fn contains(&self, noma: &Noma, course_code: &CourseCode) -> bool {
        self.0.contains(&(noma.clone(), course_code.clone()))
    }

    /// Subset of the withdrawals concerning `course_codes`.
    pub fn for_courses(&self, course_codes: &[CourseCode]) -> Self {
        Self(
            self.0
                .iter()
                .filter(|(_, course_code)| course_codes.contains(course_code))
                .cloned()
                .collect(),
        )
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<(Noma, CourseCode)> for Withdrawals {
    fn from_iter<T: IntoIterator<Item = (Noma, CourseCode)>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Lookup of exam withdrawals in the enrollment context.
pub trait WithdrawalTranslator: Send + Sync {
    fn search_withdrawn(
        &self,
        course_codes: &[CourseCode],
        session: u8,
        academic_year: u16,
    ) -> Result<Withdrawals, TranslatorError>;
}

/// Teaching assignments from the attribution context.
pub trait AttributionTranslator: Send + Sync {
    fn is_assigned(
        &self,
        teacher: &TeacherId,
        course_code: &CourseCode,
        academic_year: u16,
    ) -> Result<bool, TranslatorError>;
}

/// Global window during which teachers may encode notes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncodingPeriod {
    pub academic_year: u16,
    pub session: u8,
    pub opens_on: NaiveDate,
    pub closes_on: NaiveDate,
}

impl EncodingPeriod {
    pub fn is_open_on(&self, today: NaiveDate) -> bool {
        self.opens_on <= today && today <= self.closes_on
    }

    /// Notes can only be encoded for the period's own academic year and session.
    pub fn covers(&self, identity: &NoteRecordIdentity) -> bool {
        identity.academic_year == self.academic_year && identity.session == self.session
    }
}

pub trait EncodingPeriodProvider: Send + Sync {
    /// The current period, or `None` when encoding is closed.
    fn current_period(&self) -> Result<Option<EncodingPeriod>, TranslatorError>;
}

/// Audit trail of who persisted which notes.
pub trait EncodingHistory: Send + Sync {
    fn record(
        &self,
        teacher: &TeacherId,
        identities: &[NoteRecordIdentity],
    ) -> Result<(), RepositoryError>;
}

/// Error raised by the translators into neighbouring contexts.
#[derive(Debug, thiserror::Error)]
pub enum TranslatorError {
    #[error("translator unavailable: {0}")]
    Unavailable(String),
}

/// Outbound hook told when a cohort becomes fully graded or is corrected.
pub trait GradingNotifier: Send + Sync {
    fn publish(&self, notification: GradingNotification) -> Result<(), NotifierError>;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GradingNotification {
    pub transition: GradingTransition,
    pub group: CohortGroup,
    pub teacher: TeacherId,
}

/// Notification dispatch error.
#[derive(Debug, thiserror::Error)]
pub enum NotifierError {
    #[error("notification transport unavailable: {0}")]
    Transport(String),
}
