use crate::error::SyncError;

/// Result of dispatching one spreadsheet row.
#[derive(Debug, Clone, PartialEq)]
pub struct RowOutcome<R> {
    /// 0-based data row; the join key when results are written back.
    pub row: usize,
    /// `None` when the row never parsed into a record.
    pub record: Option<R>,
    pub remote_id: Option<i64>,
    pub lock_version: Option<i64>,
    pub error: Option<SyncError>,
}

impl<R> RowOutcome<R> {
    pub fn success(
        row: usize,
        record: R,
        remote_id: Option<i64>,
        lock_version: Option<i64>,
    ) -> Self {
        Self {
            row,
            record: Some(record),
            remote_id,
            lock_version,
            error: None,
        }
    }

    pub fn failure(row: usize, record: Option<R>, error: SyncError) -> Self {
        Self {
            row,
            record,
            remote_id: None,
            lock_version: None,
            error: Some(error),
        }
    }

    pub fn succeeded(&self) -> bool {
        self.error.is_none()
    }

    pub fn error_detail(&self) -> Option<String> {
        self.error.as_ref().map(ToString::to_string)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchSummary {
    pub succeeded: usize,
    pub failed: usize,
}

impl BatchSummary {
    pub fn from_outcomes<R>(outcomes: &[RowOutcome<R>]) -> Self {
        let succeeded = outcomes.iter().filter(|o| o.succeeded()).count();
        Self {
            succeeded,
            failed: outcomes.len() - succeeded,
        }
    }

    pub fn total(&self) -> usize {
        self.succeeded + self.failed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn summary_counts_mixed_outcomes() {
        let outcomes: Vec<RowOutcome<&str>> = vec![
            RowOutcome::success(0, "a", Some(1), None),
            RowOutcome::failure(1, Some("b"), SyncError::Transport("refused".into())),
            RowOutcome::success(2, "c", Some(2), None),
            RowOutcome::failure(
                3,
                None,
                SyncError::RowValidation {
                    row: 3,
                    reason: "blank".into(),
                },
            ),
            RowOutcome::success(4, "e", Some(3), None),
        ];
        let summary = BatchSummary::from_outcomes(&outcomes);
        assert_eq!((summary.succeeded, summary.failed, summary.total()), (3, 2, 5));
    }

    #[test]
    fn error_detail_only_on_failure() {
        let ok: RowOutcome<()> = RowOutcome::success(0, (), Some(5), Some(0));
        assert!(ok.succeeded());
        assert_eq!(ok.error_detail(), None);

        let bad: RowOutcome<()> = RowOutcome::failure(
            1,
            Some(()),
            SyncError::RemoteRejection { status: 422, body: "login taken".into() },
        );
        assert!(!bad.succeeded());
        assert!(bad.error_detail().unwrap().contains("422"));
    }
}
