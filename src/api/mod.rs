pub mod auth;
pub mod client;
pub mod endpoints;

use async_trait::async_trait;

use crate::error::SyncError;
use crate::model::group::{GroupMembershipUpdate, GroupSummary};
use crate::model::user::UserRecord;
use crate::model::work_package::{ExportedWorkPackage, ParentPatchRecord, WorkPackageRecord};

/// What the server hands back after a successful create.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Created {
    pub id: Option<i64>,
    pub lock_version: Option<i64>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WorkPackagePage {
    pub total: u64,
    pub count: u64,
    pub elements: Vec<ExportedWorkPackage>,
}

/// The OpenProject operations the bulk flows depend on. Each call is one
/// request; any non-success status comes back as `SyncError::RemoteRejection`.
#[async_trait]
pub trait OpenProjectApi: Send + Sync {
    async fn create_user(&self, user: &UserRecord) -> Result<Created, SyncError>;

    async fn update_group_members(&self, update: &GroupMembershipUpdate) -> Result<(), SyncError>;

    async fn list_groups(&self) -> Result<Vec<GroupSummary>, SyncError>;

    async fn create_work_package(&self, record: &WorkPackageRecord) -> Result<Created, SyncError>;

    /// Returns the new lockVersion when the server echoes the updated resource.
    async fn patch_parent(&self, patch: &ParentPatchRecord) -> Result<Option<i64>, SyncError>;

    async fn list_work_packages(&self, offset: u32, page_size: u32)
        -> Result<WorkPackagePage, SyncError>;
}
