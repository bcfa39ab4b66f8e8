//! Note encoding and submission for exam sessions.
//!
//! Teachers encode scores in batches; each item is parsed, checked against the record's
//! invariants and persisted independently, so one bad line never blocks the others. The
//! service also watches each (course, cohort) group and announces when it becomes fully
//! graded or is corrected afterwards.

pub mod batch;
pub mod completeness;
pub mod deadline;
pub mod domain;
pub mod import;
pub mod note;
pub mod progress;
pub mod repository;
pub mod router;
pub mod service;
pub mod validation;

#[cfg(test)]
mod tests;

pub use batch::{AggregateValidationError, BatchEncoder, BatchReport, EncodeItem, ItemFailure};
pub use completeness::{is_complete, GradingTransition};
pub use deadline::is_encodable_on;
pub use domain::{
    CohortGroup, CourseCode, ExamEnrollment, Noma, NoteRecord, NoteRecordIdentity,
    NoteRecordView, RecordError, SubmitOutcome, TeacherId,
};
pub use import::{ScoreSheetImportError, ScoreSheetImporter};
pub use note::{Justification, NoteError, NoteValue, Score};
pub use progress::{CourseProgress, DeadlineProgress, ProgressSummary};
pub use repository::{
    AttributionTranslator, EncodingHistory, EncodingPeriod, EncodingPeriodProvider,
    GradingNotification, GradingNotifier, NoteRepository, NoteSearchFilters, NotifierError,
    RepositoryError, TranslatorError, WithdrawalTranslator, Withdrawals,
};
pub use router::note_router;
pub use service::{EncodingServiceError, EncodingTranslators, NoteEncodingService};
pub use validation::{EncodeAttempt, EncodingConfig, NoteViolation, ValidationPipeline};
