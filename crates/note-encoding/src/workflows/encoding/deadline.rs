use chrono::NaiveDate;

use super::domain::NoteRecord;

/// True while `today` is on or before the record's manager deadline.
pub fn is_encodable_on(record: &NoteRecord, today: NaiveDate) -> bool {
    today <= record.manager_deadline()
}

/// A deadline counts as reached once the day after it has started.
pub fn deadline_reached(deadline: NaiveDate, today: NaiveDate) -> bool {
    today > deadline
}
