use std::io::Read;
use std::path::Path;

use serde::Deserialize;

use super::batch::EncodeItem;
use super::domain::NoteRecordIdentity;

#[derive(Debug)]
pub enum ScoreSheetImportError {
    Io(std::io::Error),
    Csv(csv::Error),
}

impl std::fmt::Display for ScoreSheetImportError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ScoreSheetImportError::Io(err) => write!(f, "failed to read score sheet: {}", err),
            ScoreSheetImportError::Csv(err) => write!(f, "invalid score sheet data: {}", err),
        }
    }
}

impl std::error::Error for ScoreSheetImportError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ScoreSheetImportError::Io(err) => Some(err),
            ScoreSheetImportError::Csv(err) => Some(err),
        }
    }
}

impl From<std::io::Error> for ScoreSheetImportError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<csv::Error> for ScoreSheetImportError {
    fn from(err: csv::Error) -> Self {
        Self::Csv(err)
    }
}

/// Reads filled-in score sheets into batch items.
///
/// Expected header: `noma,course_code,academic_year,session,note,email`. The `note` cell is
/// passed through untouched so that parse errors surface per item during the batch.
pub struct ScoreSheetImporter;

impl ScoreSheetImporter {
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Vec<EncodeItem>, ScoreSheetImportError> {
        let file = std::fs::File::open(path)?;
        Self::from_reader(file)
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Vec<EncodeItem>, ScoreSheetImportError> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(reader);
        let mut items = Vec::new();

        for row in csv_reader.deserialize::<ScoreSheetRow>() {
            items.push(row?.into_item());
        }

        tracing::debug!(rows = items.len(), "score sheet parsed");
        Ok(items)
    }
}

#[derive(Debug, Deserialize)]
struct ScoreSheetRow {
    noma: String,
    course_code: String,
    academic_year: u16,
    session: u8,
    #[serde(default)]
    note: String,
    email: String,
}

impl ScoreSheetRow {
    fn into_item(self) -> EncodeItem {
        EncodeItem::new(
            NoteRecordIdentity::new(self.noma, self.course_code, self.academic_year, self.session),
            self.note,
            self.email,
        )
    }
}
