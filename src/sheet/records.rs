use super::{Cell, Table};
use crate::error::SyncError;
use crate::model::outcome::RowOutcome;
use crate::model::user::UserRecord;
use crate::model::work_package::{
    ExportedWorkPackage, ParentPatchRecord, WorkPackageRecord, DEFAULT_PRIORITY_ID,
    DEFAULT_STATUS_ID, DEFAULT_TYPE_ID,
};

pub const USER_COLUMNS: &[&str] = &["login", "email", "firstName", "lastName", "password"];
pub const WORK_PACKAGE_COLUMNS: &[&str] = &["subject", "project_id", "author_id"];
pub const PARENT_PATCH_COLUMNS: &[&str] = &["work_package_id", "lock_version", "parent_id"];

pub const WORK_PACKAGE_ID_COLUMN: &str = "work_package_id";
pub const LOCK_VERSION_COLUMN: &str = "lock_version";

const EXPORT_COLUMNS: &[&str] = &[
    "work_package_id",
    "subject",
    "project_id",
    "author_id",
    "type_id",
    "status_id",
    "priority_id",
    "assignee_id",
    "category_id",
    "start_date",
    "due_date",
    "duration",
    "description",
    "lock_version",
    "parent_id",
];

/// One data row of a sheet, parsed or rejected.
#[derive(Debug, Clone, PartialEq)]
pub struct SheetRow<T> {
    /// 0-based index into `Table::rows`.
    pub index: usize,
    pub record: Result<T, SyncError>,
}

impl<T> SheetRow<T> {
    /// Row number as shown in a spreadsheet program (header is row 1).
    pub fn sheet_row(&self) -> usize {
        self.index + 2
    }
}

/// Collects field problems for one row so they can be reported together.
struct RowFields<'a> {
    table: &'a Table,
    index: usize,
    problems: Vec<String>,
}

impl<'a> RowFields<'a> {
    fn new(table: &'a Table, index: usize) -> Self {
        Self {
            table,
            index,
            problems: Vec::new(),
        }
    }

    fn cell(&self, name: &str) -> &'a Cell {
        self.table.cell(self.index, name)
    }

    fn text(&mut self, name: &str) -> String {
        self.cell(name).as_text().unwrap_or_else(|| {
            self.problems.push(format!("{name} is blank"));
            String::new()
        })
    }

    fn opt_text(&self, name: &str) -> Option<String> {
        self.cell(name).as_text()
    }

    fn opt_date(&self, name: &str) -> Option<String> {
        self.cell(name).as_date_text()
    }

    fn opt_id(&mut self, name: &str) -> Option<i64> {
        match self.cell(name).as_id() {
            Ok(id) => id,
            Err(reason) => {
                self.problems.push(format!("{name}: {reason}"));
                None
            }
        }
    }

    fn id(&mut self, name: &str) -> i64 {
        let before = self.problems.len();
        match self.opt_id(name) {
            Some(id) => id,
            None => {
                if self.problems.len() == before {
                    self.problems.push(format!("{name} is blank"));
                }
                0
            }
        }
    }

    fn opt_bool(&mut self, name: &str) -> Option<bool> {
        match self.cell(name).as_bool() {
            Ok(value) => value,
            Err(reason) => {
                self.problems.push(format!("{name}: {reason}"));
                None
            }
        }
    }

    fn finish<T>(self, record: T) -> SheetRow<T> {
        let record = if self.problems.is_empty() {
            Ok(record)
        } else {
            Err(SyncError::RowValidation {
                row: self.index + 2,
                reason: self.problems.join("; "),
            })
        };
        SheetRow {
            index: self.index,
            record,
        }
    }
}

fn parse_rows<T>(
    table: &Table,
    required: &[&str],
    parse: impl Fn(RowFields<'_>) -> SheetRow<T>,
) -> Result<Vec<SheetRow<T>>, SyncError> {
    table.require_columns(required)?;
    // Trailing blank rows are sheet formatting; blank rows inside the data fail
    // on their required fields like any other row.
    let end = (0..table.rows.len())
        .rposition(|index| !table.row_is_blank(index))
        .map_or(0, |last| last + 1);
    Ok((0..end)
        .map(|index| parse(RowFields::new(table, index)))
        .collect())
}

pub fn read_users(table: &Table) -> Result<Vec<SheetRow<UserRecord>>, SyncError> {
    parse_rows(table, USER_COLUMNS, |mut f| {
        let user = UserRecord {
            login: f.text("login"),
            email: f.text("email"),
            first_name: f.text("firstName"),
            last_name: f.text("lastName"),
            password: f.text("password"),
            admin: f.opt_bool("admin"),
            status: f.opt_text("status"),
        };
        f.finish(user)
    })
}

pub fn read_work_packages(table: &Table) -> Result<Vec<SheetRow<WorkPackageRecord>>, SyncError> {
    parse_rows(table, WORK_PACKAGE_COLUMNS, |mut f| {
        let subject = f.text("subject");
        let project_id = f.id("project_id");
        let author_id = f.id("author_id");
        let mut record = WorkPackageRecord::new(subject, project_id, author_id);
        record.type_id = f.opt_id("type_id").unwrap_or(DEFAULT_TYPE_ID);
        record.status_id = f.opt_id("status_id").unwrap_or(DEFAULT_STATUS_ID);
        record.priority_id = f.opt_id("priority_id").unwrap_or(DEFAULT_PRIORITY_ID);
        record.assignee_id = f.opt_id("assignee_id");
        record.category_id = f.opt_id("category_id");
        record.start_date = f.opt_date("start_date");
        record.due_date = f.opt_date("due_date");
        record.description = f.opt_text("description");
        f.finish(record)
    })
}

pub fn read_parent_patches(table: &Table) -> Result<Vec<SheetRow<ParentPatchRecord>>, SyncError> {
    parse_rows(table, PARENT_PATCH_COLUMNS, |mut f| {
        let patch = ParentPatchRecord {
            work_package_id: f.id("work_package_id"),
            lock_version: f.id("lock_version"),
            parent_id: f.id("parent_id"),
        };
        f.finish(patch)
    })
}

/// Write assigned ids and lockVersions back onto the rows they came from.
/// Rows that failed are left empty in both columns.
pub fn record_creation_results<R>(table: &mut Table, outcomes: &[RowOutcome<R>]) {
    let ids: Vec<(usize, Cell)> = outcomes
        .iter()
        .map(|o| (o.row, Cell::from(o.remote_id)))
        .collect();
    let versions: Vec<(usize, Cell)> = outcomes
        .iter()
        .map(|o| (o.row, Cell::from(o.lock_version)))
        .collect();
    table.set_column(WORK_PACKAGE_ID_COLUMN, ids);
    table.set_column(LOCK_VERSION_COLUMN, versions);
}

pub fn export_table(work_packages: &[ExportedWorkPackage]) -> Table {
    let mut table = Table::new(EXPORT_COLUMNS);
    table.rows = work_packages
        .iter()
        .map(|wp| {
            vec![
                Cell::from(wp.work_package_id),
                Cell::from(wp.subject.clone()),
                Cell::from(wp.project_id),
                Cell::from(wp.author_id),
                Cell::from(wp.type_id),
                Cell::from(wp.status_id),
                Cell::from(wp.priority_id),
                Cell::from(wp.assignee_id),
                Cell::from(wp.category_id),
                Cell::from(wp.start_date.clone()),
                Cell::from(wp.due_date.clone()),
                Cell::from(wp.duration.clone()),
                Cell::from(wp.description.clone()),
                Cell::from(wp.lock_version),
                Cell::from(wp.parent_id),
            ]
        })
        .collect();
    table
}
