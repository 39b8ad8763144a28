use anyhow::{bail, Context, Result};
use clap::{ArgAction, Args, Parser, Subcommand};
use std::path::{Path, PathBuf};

use crate::api::OpenProjectApi;
use crate::bulk::dispatch::{self, BatchReport, GroupUpdateOutcome};
use crate::bulk::export::{fetch_all_work_packages, DEFAULT_PAGE_SIZE};
use crate::model::outcome::{BatchSummary, RowOutcome};
use crate::model::user::UserRecord;
use crate::model::work_package::{
    WorkPackageRecord, DEFAULT_PRIORITY_ID, DEFAULT_STATUS_ID, DEFAULT_TYPE_ID,
};
use crate::sheet::records::{
    export_table, read_parent_patches, read_users, read_work_packages, record_creation_results,
};
use crate::sheet::{read_table, write_table};

#[derive(Debug, Parser)]
#[command(name = "opbulk")]
#[command(about = "Create OpenProject users and work packages in bulk from spreadsheets")]
pub struct Cli {
    /// Config file (default: ~/.opbulk/config.toml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Create a single user, optionally adding them to a group
    CreateUser(UserArgs),
    /// Create users from a spreadsheet
    BulkCreateUsers {
        #[arg(long)]
        excel: PathBuf,
        /// Group whose member list is replaced by the created users
        #[arg(long)]
        group_id: Option<i64>,
    },
    /// List groups with their ids
    ListGroups,
    /// Create a single work package
    CreateWorkPackage(WorkPackageArgs),
    /// Create work packages from a spreadsheet and write ids back into it
    BulkCreateWorkPackages {
        #[arg(long)]
        excel: PathBuf,
        #[arg(long, default_value_t = false)]
        no_write_back: bool,
    },
    /// Set parents from a spreadsheet of work_package_id, lock_version, parent_id
    BulkPatchWorkPackageParents {
        #[arg(long)]
        excel: PathBuf,
    },
    /// Export all work packages to a spreadsheet usable by the parent patcher
    ExportWorkPackages {
        #[arg(long)]
        excel: PathBuf,
        #[arg(long, default_value_t = DEFAULT_PAGE_SIZE)]
        page_size: u32,
    },
}

#[derive(Debug, Args)]
pub struct UserArgs {
    #[arg(long)]
    pub login: String,
    #[arg(long)]
    pub email: String,
    #[arg(long)]
    pub first_name: String,
    #[arg(long)]
    pub last_name: String,
    #[arg(long)]
    pub password: String,
    #[arg(long, default_value_t = false)]
    pub admin: bool,
    #[arg(long, default_value = "active")]
    pub status: String,
    #[arg(long)]
    pub group_id: Option<i64>,
}

impl UserArgs {
    fn to_record(&self) -> UserRecord {
        UserRecord {
            login: self.login.clone(),
            email: self.email.clone(),
            first_name: self.first_name.clone(),
            last_name: self.last_name.clone(),
            password: self.password.clone(),
            admin: Some(self.admin),
            status: Some(self.status.clone()),
        }
    }
}

#[derive(Debug, Args)]
pub struct WorkPackageArgs {
    #[arg(long)]
    pub subject: String,
    #[arg(long)]
    pub project_id: i64,
    #[arg(long)]
    pub author_id: i64,
    #[arg(long, default_value_t = DEFAULT_TYPE_ID)]
    pub type_id: i64,
    #[arg(long, default_value_t = DEFAULT_STATUS_ID)]
    pub status_id: i64,
    #[arg(long, default_value_t = DEFAULT_PRIORITY_ID)]
    pub priority_id: i64,
    #[arg(long)]
    pub assignee_id: Option<i64>,
    #[arg(long)]
    pub category_id: Option<i64>,
    /// YYYY-MM-DD
    #[arg(long)]
    pub start_date: Option<String>,
    /// YYYY-MM-DD
    #[arg(long)]
    pub due_date: Option<String>,
    #[arg(long)]
    pub description: Option<String>,
}

impl WorkPackageArgs {
    fn to_record(&self) -> WorkPackageRecord {
        WorkPackageRecord {
            subject: self.subject.clone(),
            project_id: self.project_id,
            type_id: self.type_id,
            status_id: self.status_id,
            priority_id: self.priority_id,
            author_id: self.author_id,
            assignee_id: self.assignee_id,
            category_id: self.category_id,
            start_date: self.start_date.clone(),
            due_date: self.due_date.clone(),
            description: self.description.clone(),
        }
    }
}

pub async fn run(api: &dyn OpenProjectApi, command: Command) -> Result<()> {
    match command {
        Command::CreateUser(args) => handle_create_user(api, &args).await,
        Command::BulkCreateUsers { excel, group_id } => {
            handle_bulk_create_users(api, &excel, group_id).await
        }
        Command::ListGroups => handle_list_groups(api).await,
        Command::CreateWorkPackage(args) => handle_create_work_package(api, &args).await,
        Command::BulkCreateWorkPackages {
            excel,
            no_write_back,
        } => handle_bulk_create_work_packages(api, &excel, !no_write_back).await,
        Command::BulkPatchWorkPackageParents { excel } => {
            handle_bulk_patch_parents(api, &excel).await
        }
        Command::ExportWorkPackages { excel, page_size } => {
            handle_export(api, &excel, page_size).await
        }
    }
}

async fn handle_create_user(api: &dyn OpenProjectApi, args: &UserArgs) -> Result<()> {
    let user = args.to_record();
    let created = api
        .create_user(&user)
        .await
        .with_context(|| format!("Failed to create user {}", user.login))?;
    println!("✅ Created user {} (id: {})", user.login, fmt_id(created.id));

    if let (Some(group_id), Some(user_id)) = (args.group_id, created.id) {
        let outcome = dispatch::update_group(api, group_id, [user_id]).await;
        print_group_update(&outcome);
    }
    Ok(())
}

async fn handle_bulk_create_users(
    api: &dyn OpenProjectApi,
    excel: &Path,
    group_id: Option<i64>,
) -> Result<()> {
    let table = read_table(excel)?;
    let rows = read_users(&table)?;
    println!("Creating {} users from {}", rows.len(), excel.display());

    let report = dispatch::bulk_create_users(api, rows, group_id).await;
    print_outcomes(&report.batch, |u| u.login.clone());
    if let Some(group) = &report.group_update {
        print_group_update(group);
    }
    print_summary(&report.batch.summary);
    Ok(())
}

async fn handle_list_groups(api: &dyn OpenProjectApi) -> Result<()> {
    let groups = api.list_groups().await.context("Failed to list groups")?;
    if groups.is_empty() {
        println!("No groups found.");
    }
    for (idx, group) in groups.iter().enumerate() {
        println!("{}. {} (id: {})", idx + 1, group.name, group.id);
    }
    Ok(())
}

async fn handle_create_work_package(
    api: &dyn OpenProjectApi,
    args: &WorkPackageArgs,
) -> Result<()> {
    let record = args.to_record();
    let created = api
        .create_work_package(&record)
        .await
        .with_context(|| format!("Failed to create work package '{}'", record.subject))?;
    println!(
        "✅ Created work package '{}' (id: {}, lockVersion: {})",
        record.subject,
        fmt_id(created.id),
        fmt_id(created.lock_version)
    );
    Ok(())
}

async fn handle_bulk_create_work_packages(
    api: &dyn OpenProjectApi,
    excel: &Path,
    write_back: bool,
) -> Result<()> {
    let mut table = read_table(excel)?;
    let rows = read_work_packages(&table)?;
    println!("Creating {} work packages from {}", rows.len(), excel.display());

    let report = dispatch::bulk_create_work_packages(api, rows).await;
    print_outcomes(&report, |wp| wp.subject.clone());
    print_summary(&report.summary);

    if write_back {
        record_creation_results(&mut table, &report.outcomes);
        write_table(excel, &table)?;
        println!("Wrote work_package_id and lock_version to {}", excel.display());
    }
    Ok(())
}

async fn handle_bulk_patch_parents(api: &dyn OpenProjectApi, excel: &Path) -> Result<()> {
    let table = read_table(excel)?;
    let rows = read_parent_patches(&table)?;
    println!("Setting parents for {} work packages", rows.len());

    let report = dispatch::bulk_patch_parents(api, rows).await;
    print_outcomes(&report, |p| {
        format!("work package {} -> parent {}", p.work_package_id, p.parent_id)
    });
    print_summary(&report.summary);
    Ok(())
}

async fn handle_export(api: &dyn OpenProjectApi, excel: &Path, page_size: u32) -> Result<()> {
    if page_size == 0 {
        bail!("--page-size must be at least 1");
    }
    let work_packages = fetch_all_work_packages(api, page_size)
        .await
        .context("Failed to fetch work packages")?;
    write_table(excel, &export_table(&work_packages))?;
    println!("✅ Exported {} work packages to {}", work_packages.len(), excel.display());
    Ok(())
}

fn fmt_id(id: Option<i64>) -> String {
    id.map_or_else(|| "?".to_string(), |id| id.to_string())
}

fn print_outcomes<R>(report: &BatchReport<R>, label: impl Fn(&R) -> String) {
    for outcome in &report.outcomes {
        println!("{}", outcome_line(outcome, &label));
    }
}

fn outcome_line<R>(outcome: &RowOutcome<R>, label: impl Fn(&R) -> String) -> String {
    let name = outcome.record.as_ref().map(label);
    match (name, outcome.error_detail()) {
        (Some(name), None) => match outcome.remote_id {
            Some(id) => format!("✅ {name} (id: {id})"),
            None => format!("✅ {name}"),
        },
        (Some(name), Some(detail)) => format!("❌ {name}: {detail}"),
        // Rows that never parsed carry their row number in the error.
        (None, Some(detail)) => format!("❌ {detail}"),
        (None, None) => format!("✅ row {}", outcome.row + 2),
    }
}

fn print_group_update(outcome: &GroupUpdateOutcome) {
    match &outcome.result {
        Ok(()) => println!(
            "✅ Group {} now has {} member(s)",
            outcome.update.group_id,
            outcome.update.member_user_ids.len()
        ),
        Err(e) => println!("❌ Failed to update group {}: {e}", outcome.update.group_id),
    }
}

fn print_summary(summary: &BatchSummary) {
    println!();
    println!("Succeeded: {}", summary.succeeded);
    println!("Failed:    {}", summary.failed);
    println!("Total:     {}", summary.total());
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SyncError;

    fn parse(args: &[&str]) -> Result<Cli, clap::Error> {
        Cli::try_parse_from(std::iter::once("opbulk").chain(args.iter().copied()))
    }

    #[test]
    fn parse_create_user_with_defaults() {
        let cli = parse(&[
            "create-user",
            "--login",
            "jdoe",
            "--email",
            "jdoe@example.com",
            "--first-name",
            "Jane",
            "--last-name",
            "Doe",
            "--password",
            "secret-secret",
        ])
        .unwrap();
        let Command::CreateUser(args) = cli.command else {
            panic!("expected create-user");
        };
        let record = args.to_record();
        assert_eq!(record.login, "jdoe");
        assert_eq!(record.admin, Some(false));
        assert_eq!(record.status.as_deref(), Some("active"));
        assert_eq!(args.group_id, None);
    }

    #[test]
    fn parse_create_user_missing_field_fails() {
        let result = parse(&["create-user", "--login", "jdoe"]);
        assert!(result.is_err());
    }

    #[test]
    fn parse_bulk_users_with_group() {
        let cli = parse(&[
            "bulk-create-users",
            "--excel",
            "users.xlsx",
            "--group-id",
            "5",
        ])
        .unwrap();
        match cli.command {
            Command::BulkCreateUsers { excel, group_id } => {
                assert_eq!(excel, PathBuf::from("users.xlsx"));
                assert_eq!(group_id, Some(5));
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn parse_work_package_defaults() {
        let cli = parse(&[
            "create-work-package",
            "--subject",
            "Install servers",
            "--project-id",
            "3",
            "--author-id",
            "1",
            "--start-date",
            "2024-01-01",
            "--due-date",
            "2024-01-05",
        ])
        .unwrap();
        let Command::CreateWorkPackage(args) = cli.command else {
            panic!("expected create-work-package");
        };
        let record = args.to_record();
        assert_eq!(record.type_id, 1);
        assert_eq!(record.status_id, 1);
        assert_eq!(record.priority_id, 9);
        assert_eq!(record.assignee_id, None);
        assert_eq!(record.duration().as_deref(), Some("P5D"));
    }

    #[test]
    fn parse_global_flags_after_subcommand() {
        let cli = parse(&["list-groups", "-vv", "--config", "/tmp/op.toml"]).unwrap();
        assert_eq!(cli.verbose, 2);
        assert_eq!(cli.config, Some(PathBuf::from("/tmp/op.toml")));
    }

    #[test]
    fn parse_patch_and_export() {
        let cli = parse(&["bulk-patch-work-package-parents", "--excel", "wp.xlsx"]).unwrap();
        assert!(matches!(cli.command, Command::BulkPatchWorkPackageParents { .. }));

        let cli = parse(&["export-work-packages", "--excel", "wp.xlsx"]).unwrap();
        match cli.command {
            Command::ExportWorkPackages { page_size, .. } => assert_eq!(page_size, 100),
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn parse_write_back_toggle() {
        let cli = parse(&[
            "bulk-create-work-packages",
            "--excel",
            "wp.xlsx",
            "--no-write-back",
        ])
        .unwrap();
        assert!(matches!(
            cli.command,
            Command::BulkCreateWorkPackages { no_write_back: true, .. }
        ));
    }

    #[test]
    fn outcome_lines() {
        let ok = RowOutcome::success(0, "alice".to_string(), Some(42), None);
        assert_eq!(outcome_line(&ok, |s: &String| s.clone()), "✅ alice (id: 42)");

        let bad: RowOutcome<String> = RowOutcome::failure(
            3,
            None,
            SyncError::RowValidation {
                row: 5,
                reason: "email is blank".into(),
            },
        );
        assert_eq!(
            outcome_line(&bad, |s: &String| s.clone()),
            "❌ row 5: email is blank"
        );
    }
}
