use crate::infra::{seed_campus, student_email, Campus, DEMO_TEACHER};
use chrono::{Local, NaiveDate};
use clap::Args;
use note_encoding::config::AppConfig;
use note_encoding::error::AppError;
use note_encoding::telemetry;
use note_encoding::workflows::encoding::{
    AggregateValidationError, EncodeItem, EncodingConfig, EncodingServiceError,
    NoteRecordIdentity, NoteRepository, NoteSearchFilters, ProgressSummary, ScoreSheetImporter,
    TeacherId,
};
use std::path::PathBuf;

#[derive(Args, Debug)]
pub(crate) struct EncodeArgs {
    /// Score sheet with columns noma,course_code,academic_year,session,note,email
    #[arg(long)]
    pub(crate) csv: PathBuf,
    /// Registration number of the encoding teacher
    #[arg(long, default_value = DEMO_TEACHER)]
    pub(crate) teacher: String,
    /// Override the encoding date (defaults to today)
    #[arg(long, value_parser = crate::infra::parse_date)]
    pub(crate) today: Option<NaiveDate>,
}

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// Override the demo date (defaults to today)
    #[arg(long, value_parser = crate::infra::parse_date)]
    pub(crate) today: Option<NaiveDate>,
}

pub(crate) fn run_encode(args: EncodeArgs) -> Result<(), AppError> {
    let EncodeArgs {
        csv,
        teacher,
        today,
    } = args;

    let config = AppConfig::load()?;
    telemetry::init(&config.telemetry)?;

    let today = today.unwrap_or_else(|| Local::now().date_naive());
    let campus = seed(config.encoding, today)?;
    let items = ScoreSheetImporter::from_path(&csv)?;

    println!("Encoding {} line(s) from {}", items.len(), csv.display());
    let teacher = TeacherId(teacher);
    let result = campus.service.encode_batch(&teacher, items, today);
    render_batch(result)?;

    let progress = campus
        .service
        .search_progress(&NoteSearchFilters::default(), today)?;
    render_progress(&progress);
    Ok(())
}

pub(crate) fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let today = args.today.unwrap_or_else(|| Local::now().date_naive());
    let campus = seed(EncodingConfig::default(), today)?;
    let teacher = TeacherId(DEMO_TEACHER.to_string());
    let identity =
        |noma: &str| NoteRecordIdentity::new(noma, "LDROI1001", campus.academic_year, campus.session);

    println!("Note encoding demo ({today})");
    println!("\nStep 1: first pass over LDROI1001, one typo and one wrong e-mail");
    let first_pass = vec![
        EncodeItem::new(identity("20210001"), "14", student_email("20210001")),
        EncodeItem::new(identity("20210002"), "12.5", student_email("20210002")),
        EncodeItem::new(identity("20210003"), "M", "someone@example.org"),
    ];
    render_batch(campus.service.encode_batch(&teacher, first_pass, today))?;

    println!("\nStep 2: corrections");
    let corrections = vec![
        EncodeItem::new(identity("20210002"), "12", student_email("20210002")),
        EncodeItem::new(identity("20210003"), "M", student_email("20210003")),
    ];
    render_batch(campus.service.encode_batch(&teacher, corrections, today))?;

    for notification in campus.notifier.events() {
        println!(
            "  notification: {} is {}",
            notification.group,
            notification.transition.label()
        );
    }

    println!("\nStep 3: submission");
    let to_submit = ["20210001", "20210002", "20210003", "20210004"]
        .into_iter()
        .map(identity)
        .collect();
    render_batch(campus.service.submit_many(&teacher, to_submit, today))?;

    let stored = campus
        .repository
        .get(&identity("20210003"))
        .map_err(EncodingServiceError::from)?;
    if let Some(record) = stored {
        let view = record.view();
        println!(
            "  {} now reads '{}' (submitted: {})",
            view.identity, view.value, view.submitted
        );
    }

    println!("\nStep 4: progress");
    let progress = campus
        .service
        .search_progress(&NoteSearchFilters::default(), today)?;
    render_progress(&progress);
    Ok(())
}

fn seed(config: EncodingConfig, today: NaiveDate) -> Result<Campus, AppError> {
    seed_campus(config, today)
        .map_err(|err| AppError::Io(std::io::Error::new(std::io::ErrorKind::InvalidData, err)))
}

/// Print accepted identities and itemized failures; other errors are returned.
fn render_batch(
    result: Result<Vec<NoteRecordIdentity>, EncodingServiceError>,
) -> Result<(), AppError> {
    match result {
        Ok(accepted) => {
            println!("  accepted: {}", accepted.len());
            for identity in accepted {
                println!("    - {identity}");
            }
            Ok(())
        }
        Err(EncodingServiceError::Validation(error)) => {
            render_failures(&error);
            Ok(())
        }
        Err(other) => Err(other.into()),
    }
}

fn render_failures(error: &AggregateValidationError) {
    println!("  accepted: {}", error.accepted.len());
    for identity in &error.accepted {
        println!("    - {identity}");
    }
    println!("  rejected: {}", error.failures.len());
    for failure in &error.failures {
        let reasons: Vec<String> = failure
            .violations
            .iter()
            .map(|violation| format!("{} ({})", violation, violation.code()))
            .collect();
        println!("    - {}: {}", failure.identity, reasons.join("; "));
    }
}

fn render_progress(progress: &ProgressSummary) {
    if progress.courses.is_empty() {
        println!("  no notes found");
        return;
    }
    for course in &progress.courses {
        println!(
            "  {} {}/session-{}: {}/{} submitted{}",
            course.course_code,
            course.academic_year,
            course.session,
            course.submitted,
            course.total,
            if course.complete { " (complete)" } else { "" }
        );
        for deadline in &course.deadlines {
            println!(
                "    tutor deadline {}: {}/{}{}",
                deadline.deadline,
                deadline.submitted,
                deadline.total,
                if deadline.reached { " (reached)" } else { "" }
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 1, 12).expect("valid date")
    }

    #[test]
    fn demo_runs_against_seeded_data() {
        run_demo(DemoArgs {
            today: Some(today()),
        })
        .expect("demo completes");
    }

    #[test]
    fn validation_failures_do_not_abort_rendering() {
        let error = EncodingServiceError::Validation(AggregateValidationError {
            accepted: Vec::new(),
            failures: Vec::new(),
        });
        assert!(render_batch(Err(error)).is_ok());
        assert!(render_batch(Err(EncodingServiceError::EncodingPeriodClosed)).is_err());
    }
}
