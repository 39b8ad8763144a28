use chrono::NaiveDate;

pub const DEFAULT_TYPE_ID: i64 = 1;
pub const DEFAULT_STATUS_ID: i64 = 1;
pub const DEFAULT_PRIORITY_ID: i64 = 9;

const DATE_FORMAT: &str = "%Y-%m-%d";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkPackageRecord {
    pub subject: String,
    pub project_id: i64,
    pub type_id: i64,
    pub status_id: i64,
    pub priority_id: i64,
    pub author_id: i64,
    pub assignee_id: Option<i64>,
    pub category_id: Option<i64>,
    /// `YYYY-MM-DD` when the source cell was date-like, otherwise the raw text.
    pub start_date: Option<String>,
    pub due_date: Option<String>,
    pub description: Option<String>,
}

impl WorkPackageRecord {
    pub fn new(subject: impl Into<String>, project_id: i64, author_id: i64) -> Self {
        Self {
            subject: subject.into(),
            project_id,
            type_id: DEFAULT_TYPE_ID,
            status_id: DEFAULT_STATUS_ID,
            priority_id: DEFAULT_PRIORITY_ID,
            author_id,
            assignee_id: None,
            category_id: None,
            start_date: None,
            due_date: None,
            description: None,
        }
    }

    /// Inclusive day count between start and due date as an ISO-8601
    /// duration (`P<n>D`). `None` unless both dates parse and due >= start.
    pub fn duration(&self) -> Option<String> {
        let start = NaiveDate::parse_from_str(self.start_date.as_deref()?, DATE_FORMAT).ok()?;
        let due = NaiveDate::parse_from_str(self.due_date.as_deref()?, DATE_FORMAT).ok()?;
        let days = (due - start).num_days() + 1;
        (days > 0).then(|| format!("P{days}D"))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParentPatchRecord {
    pub work_package_id: i64,
    pub lock_version: i64,
    pub parent_id: i64,
}

/// Flattened listing entry, laid out so it can be fed back to the parent patcher.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExportedWorkPackage {
    pub work_package_id: Option<i64>,
    pub subject: Option<String>,
    pub project_id: Option<i64>,
    pub author_id: Option<i64>,
    pub type_id: Option<i64>,
    pub status_id: Option<i64>,
    pub priority_id: Option<i64>,
    pub assignee_id: Option<i64>,
    pub category_id: Option<i64>,
    pub start_date: Option<String>,
    pub due_date: Option<String>,
    pub duration: Option<String>,
    pub description: Option<String>,
    pub lock_version: Option<i64>,
    pub parent_id: Option<i64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dated(start: &str, due: &str) -> WorkPackageRecord {
        let mut record = WorkPackageRecord::new("Task", 3, 1);
        record.start_date = Some(start.into());
        record.due_date = Some(due.into());
        record
    }

    #[test]
    fn defaults_match_remote_ids() {
        let record = WorkPackageRecord::new("Task", 3, 1);
        assert_eq!(record.type_id, 1);
        assert_eq!(record.status_id, 1);
        assert_eq!(record.priority_id, 9);
    }

    #[test]
    fn duration_counts_both_ends() {
        assert_eq!(dated("2024-01-01", "2024-01-05").duration().as_deref(), Some("P5D"));
        assert_eq!(dated("2024-03-10", "2024-03-10").duration().as_deref(), Some("P1D"));
    }

    #[test]
    fn duration_spans_month_and_leap_day() {
        assert_eq!(dated("2024-02-28", "2024-03-01").duration().as_deref(), Some("P3D"));
    }

    #[test]
    fn duration_needs_both_dates() {
        let mut record = WorkPackageRecord::new("Task", 3, 1);
        record.start_date = Some("2024-01-01".into());
        assert_eq!(record.duration(), None);
    }

    #[test]
    fn unparseable_dates_yield_no_duration() {
        assert_eq!(dated("01/01/2024", "2024-01-05").duration(), None);
        assert_eq!(dated("2024-01-01", "soon").duration(), None);
    }

    #[test]
    fn reversed_dates_yield_no_duration() {
        assert_eq!(dated("2024-01-05", "2024-01-01").duration(), None);
    }
}
