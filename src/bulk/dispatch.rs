use tracing::{info, warn};

use crate::api::OpenProjectApi;
use crate::error::SyncError;
use crate::model::group::GroupMembershipUpdate;
use crate::model::outcome::{BatchSummary, RowOutcome};
use crate::model::user::UserRecord;
use crate::model::work_package::{ParentPatchRecord, WorkPackageRecord};
use crate::sheet::records::SheetRow;

#[derive(Debug)]
pub struct BatchReport<R> {
    pub outcomes: Vec<RowOutcome<R>>,
    pub summary: BatchSummary,
}

impl<R> BatchReport<R> {
    fn new(outcomes: Vec<RowOutcome<R>>) -> Self {
        let summary = BatchSummary::from_outcomes(&outcomes);
        Self { outcomes, summary }
    }
}

#[derive(Debug)]
pub struct GroupUpdateOutcome {
    pub update: GroupMembershipUpdate,
    pub result: Result<(), SyncError>,
}

#[derive(Debug)]
pub struct UserBatchReport {
    pub batch: BatchReport<UserRecord>,
    /// Set only when a group was requested and at least one user was created.
    pub group_update: Option<GroupUpdateOutcome>,
}

/// Replace the member list of `group_id` with `user_ids`.
pub async fn update_group(
    api: &dyn OpenProjectApi,
    group_id: i64,
    user_ids: impl IntoIterator<Item = i64>,
) -> GroupUpdateOutcome {
    let update = GroupMembershipUpdate::new(group_id, user_ids);
    let result = api.update_group_members(&update).await;
    match &result {
        Ok(()) => info!(group_id, members = update.member_user_ids.len(), "group members updated"),
        Err(e) => warn!(group_id, error = %e, "group member update failed"),
    }
    GroupUpdateOutcome { update, result }
}

/// Create every parsed user in sheet order. A failed row never stops the
/// batch; invalid rows are counted as failures without a request.
pub async fn bulk_create_users(
    api: &dyn OpenProjectApi,
    rows: Vec<SheetRow<UserRecord>>,
    group_id: Option<i64>,
) -> UserBatchReport {
    let mut outcomes = Vec::with_capacity(rows.len());
    let mut created_ids = Vec::new();

    for row in rows {
        let sheet_row = row.sheet_row();
        let user = match row.record {
            Ok(user) => user,
            Err(e) => {
                warn!(row = sheet_row, error = %e, "skipping user row");
                outcomes.push(RowOutcome::failure(row.index, None, e));
                continue;
            }
        };

        match api.create_user(&user).await {
            Ok(created) => {
                info!(login = %user.login, id = ?created.id, "user created");
                if let Some(id) = created.id {
                    created_ids.push(id);
                }
                outcomes.push(RowOutcome::success(row.index, user, created.id, None));
            }
            Err(e) => {
                warn!(login = %user.login, error = %e, "user creation failed");
                outcomes.push(RowOutcome::failure(row.index, Some(user), e));
            }
        }
    }

    let group_update = match group_id {
        Some(group_id) if !created_ids.is_empty() => {
            Some(update_group(api, group_id, created_ids).await)
        }
        _ => None,
    };

    UserBatchReport {
        batch: BatchReport::new(outcomes),
        group_update,
    }
}

/// Create every parsed work package in sheet order, keeping the assigned id
/// and lockVersion of each success for write-back.
pub async fn bulk_create_work_packages(
    api: &dyn OpenProjectApi,
    rows: Vec<SheetRow<WorkPackageRecord>>,
) -> BatchReport<WorkPackageRecord> {
    let mut outcomes = Vec::with_capacity(rows.len());

    for row in rows {
        let sheet_row = row.sheet_row();
        let record = match row.record {
            Ok(record) => record,
            Err(e) => {
                warn!(row = sheet_row, error = %e, "skipping work package row");
                outcomes.push(RowOutcome::failure(row.index, None, e));
                continue;
            }
        };

        match api.create_work_package(&record).await {
            Ok(created) => {
                info!(
                    subject = %record.subject,
                    id = ?created.id,
                    lock_version = ?created.lock_version,
                    "work package created"
                );
                outcomes.push(RowOutcome::success(
                    row.index,
                    record,
                    created.id,
                    created.lock_version,
                ));
            }
            Err(e) => {
                warn!(subject = %record.subject, error = %e, "work package creation failed");
                outcomes.push(RowOutcome::failure(row.index, Some(record), e));
            }
        }
    }

    BatchReport::new(outcomes)
}

/// Point each work package at its new parent. A stale lockVersion only fails
/// its own row; nothing is re-fetched.
pub async fn bulk_patch_parents(
    api: &dyn OpenProjectApi,
    rows: Vec<SheetRow<ParentPatchRecord>>,
) -> BatchReport<ParentPatchRecord> {
    let mut outcomes = Vec::with_capacity(rows.len());

    for row in rows {
        let sheet_row = row.sheet_row();
        let patch = match row.record {
            Ok(patch) => patch,
            Err(e) => {
                warn!(row = sheet_row, error = %e, "skipping parent patch row");
                outcomes.push(RowOutcome::failure(row.index, None, e));
                continue;
            }
        };

        match api.patch_parent(&patch).await {
            Ok(lock_version) => {
                info!(
                    work_package_id = patch.work_package_id,
                    parent_id = patch.parent_id,
                    "parent set"
                );
                outcomes.push(RowOutcome::success(
                    row.index,
                    patch,
                    Some(patch.work_package_id),
                    lock_version,
                ));
            }
            Err(e) => {
                warn!(work_package_id = patch.work_package_id, error = %e, "parent patch failed");
                outcomes.push(RowOutcome::failure(row.index, Some(patch), e));
            }
        }
    }

    BatchReport::new(outcomes)
}
