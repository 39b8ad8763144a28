//! Request bodies for the OpenProject v3 API.
//!
//! Absent values are skipped rather than sent as `null`: the API treats a
//! present-but-null link as "clear this relation".

use serde::Serialize;

use crate::api::endpoints::API_PREFIX;
use crate::model::group::GroupMembershipUpdate;
use crate::model::user::UserRecord;
use crate::model::work_package::{ParentPatchRecord, WorkPackageRecord};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Link {
    pub href: String,
}

impl Link {
    pub fn to(plural: &str, id: i64) -> Self {
        Self {
            href: format!("{API_PREFIX}/{plural}/{id}"),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserPayload<'a> {
    pub login: &'a str,
    pub email: &'a str,
    pub first_name: &'a str,
    pub last_name: &'a str,
    pub password: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub admin: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<&'a str>,
}

pub fn user_payload(user: &UserRecord) -> UserPayload<'_> {
    UserPayload {
        login: &user.login,
        email: &user.email,
        first_name: &user.first_name,
        last_name: &user.last_name,
        password: &user.password,
        admin: user.admin,
        status: user.status.as_deref(),
    }
}

#[derive(Debug, Serialize)]
pub struct WorkPackageLinks {
    #[serde(rename = "type")]
    pub kind: Link,
    pub priority: Link,
    pub project: Link,
    pub status: Link,
    pub author: Link,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assignee: Option<Link>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<Link>,
}

#[derive(Debug, Serialize)]
pub struct Formattable<'a> {
    pub raw: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkPackagePayload<'a> {
    pub subject: &'a str,
    pub schedule_manually: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_date: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub due_date: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<Formattable<'a>>,
    #[serde(rename = "_links")]
    pub links: WorkPackageLinks,
}

pub fn work_package_payload(record: &WorkPackageRecord) -> WorkPackagePayload<'_> {
    WorkPackagePayload {
        subject: &record.subject,
        schedule_manually: true,
        start_date: record.start_date.as_deref(),
        due_date: record.due_date.as_deref(),
        duration: record.duration(),
        description: record.description.as_deref().map(|raw| Formattable { raw }),
        links: WorkPackageLinks {
            kind: Link::to("types", record.type_id),
            priority: Link::to("priorities", record.priority_id),
            project: Link::to("projects", record.project_id),
            status: Link::to("statuses", record.status_id),
            author: Link::to("users", record.author_id),
            assignee: record.assignee_id.map(|id| Link::to("users", id)),
            category: record.category_id.map(|id| Link::to("categories", id)),
        },
    }
}

#[derive(Debug, Serialize)]
pub struct ParentLinks {
    pub parent: Link,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ParentPatchPayload {
    pub lock_version: i64,
    #[serde(rename = "_links")]
    pub links: ParentLinks,
}

pub fn parent_patch_payload(patch: &ParentPatchRecord) -> ParentPatchPayload {
    ParentPatchPayload {
        lock_version: patch.lock_version,
        links: ParentLinks {
            parent: Link::to("work_packages", patch.parent_id),
        },
    }
}

#[derive(Debug, Serialize)]
pub struct MemberLinks {
    pub members: Vec<Link>,
}

#[derive(Debug, Serialize)]
pub struct GroupMembersPayload<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<&'a str>,
    #[serde(rename = "_links")]
    pub links: MemberLinks,
}

pub fn group_members_payload(update: &GroupMembershipUpdate) -> GroupMembersPayload<'_> {
    GroupMembersPayload {
        name: update.group_name.as_deref(),
        links: MemberLinks {
            members: update
                .member_user_ids
                .iter()
                .map(|&id| Link::to("users", id))
                .collect(),
        },
    }
}
