use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::StatusCode;
use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, warn};

use super::auth::auth_headers;
use super::endpoints::{item_url, list_url, resource_url, Resource};
use super::{Created, OpenProjectApi, WorkPackagePage};
use crate::config::AppConfig;
use crate::error::SyncError;
use crate::model::group::{GroupMembershipUpdate, GroupSummary};
use crate::model::user::UserRecord;
use crate::model::work_package::{ExportedWorkPackage, ParentPatchRecord, WorkPackageRecord};
use crate::payload::{
    group_members_payload, parent_patch_payload, user_payload, work_package_payload,
};
use crate::util::links::{formattable_text, id_from_href};

const CREATED: &[StatusCode] = &[StatusCode::CREATED];
const UPDATED: &[StatusCode] = &[StatusCode::OK, StatusCode::NO_CONTENT];
const FETCHED: &[StatusCode] = &[StatusCode::OK];

pub struct OpenProjectClient {
    base_url: String,
    client: reqwest::Client,
}

impl OpenProjectClient {
    pub fn new(config: &AppConfig) -> Result<Self, SyncError> {
        let mut headers = HeaderMap::new();
        for (name, value) in auth_headers(&config.api_key) {
            let name = HeaderName::from_bytes(name.to_ascii_lowercase().as_bytes())
                .map_err(|e| SyncError::Configuration(format!("header {name}: {e}")))?;
            let value = HeaderValue::from_str(&value)
                .map_err(|e| SyncError::Configuration(format!("header {name}: {e}")))?;
            headers.insert(name, value);
        }
        let client = reqwest::Client::builder()
            .default_headers(headers)
            .build()?;
        Ok(Self {
            base_url: config.base_url.clone(),
            client,
        })
    }

    async fn send<B: Serialize + Sync + ?Sized>(
        &self,
        method: reqwest::Method,
        url: &str,
        body: Option<&B>,
        expected: &[StatusCode],
    ) -> Result<String, SyncError> {
        debug!(method = method.as_str(), url, "sending request");
        let mut request = self.client.request(method, url);
        if let Some(body) = body {
            request = request.json(body);
        }
        let resp = request.send().await?;
        let status = resp.status();
        let text = resp.text().await?;
        debug!(status = status.as_u16(), url, "received response");
        check_status(status, expected, text)
    }
}

fn check_status(
    status: StatusCode,
    expected: &[StatusCode],
    body: String,
) -> Result<String, SyncError> {
    if expected.contains(&status) {
        Ok(body)
    } else {
        Err(SyncError::RemoteRejection {
            status: status.as_u16(),
            body,
        })
    }
}

fn parse_json<'a, T: Deserialize<'a>>(body: &'a str, what: &str) -> Result<T, SyncError> {
    serde_json::from_str(body)
        .map_err(|e| SyncError::Transport(format!("unexpected {what} response: {e}")))
}

#[derive(Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct ResourceBody {
    id: Option<i64>,
    lock_version: Option<i64>,
}

fn parse_resource(body: &str) -> Result<Created, SyncError> {
    if body.trim().is_empty() {
        return Ok(Created::default());
    }
    let parsed: ResourceBody = parse_json(body, "create")?;
    Ok(Created {
        id: parsed.id,
        lock_version: parsed.lock_version,
    })
}

/// The status already says the resource exists; an unreadable body only
/// loses the id and lockVersion.
fn parse_created(body: &str) -> Created {
    parse_resource(body).unwrap_or_else(|e| {
        warn!(error = %e, "successful write returned an unreadable body");
        Created::default()
    })
}

#[derive(Deserialize)]
struct Collection<T> {
    #[serde(default)]
    total: u64,
    #[serde(default)]
    count: u64,
    #[serde(rename = "_embedded")]
    embedded: Embedded<T>,
}

#[derive(Deserialize)]
struct Embedded<T> {
    #[serde(default = "Vec::new")]
    elements: Vec<T>,
}

#[derive(Deserialize)]
struct GroupElement {
    id: i64,
    name: String,
}

fn parse_groups(body: &str) -> Result<Vec<GroupSummary>, SyncError> {
    let collection: Collection<GroupElement> = parse_json(body, "group list")?;
    Ok(collection
        .embedded
        .elements
        .into_iter()
        .map(|g| GroupSummary { id: g.id, name: g.name })
        .collect())
}

#[derive(Deserialize, Default)]
struct LinkRef {
    href: Option<String>,
}

impl LinkRef {
    fn id(link: &Option<LinkRef>) -> Option<i64> {
        link.as_ref()?.href.as_deref().and_then(id_from_href)
    }
}

#[derive(Deserialize, Default)]
struct WorkPackageLinksBody {
    project: Option<LinkRef>,
    author: Option<LinkRef>,
    #[serde(rename = "type")]
    kind: Option<LinkRef>,
    status: Option<LinkRef>,
    priority: Option<LinkRef>,
    assignee: Option<LinkRef>,
    category: Option<LinkRef>,
    parent: Option<LinkRef>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct WorkPackageElement {
    id: Option<i64>,
    subject: Option<String>,
    start_date: Option<String>,
    due_date: Option<String>,
    duration: Option<String>,
    #[serde(default)]
    description: Value,
    lock_version: Option<i64>,
    #[serde(rename = "_links", default)]
    links: WorkPackageLinksBody,
}

impl From<WorkPackageElement> for ExportedWorkPackage {
    fn from(wp: WorkPackageElement) -> Self {
        let links = &wp.links;
        ExportedWorkPackage {
            work_package_id: wp.id,
            project_id: LinkRef::id(&links.project),
            author_id: LinkRef::id(&links.author),
            type_id: LinkRef::id(&links.kind),
            status_id: LinkRef::id(&links.status),
            priority_id: LinkRef::id(&links.priority),
            assignee_id: LinkRef::id(&links.assignee),
            category_id: LinkRef::id(&links.category),
            parent_id: LinkRef::id(&links.parent),
            description: formattable_text(&wp.description),
            subject: wp.subject,
            start_date: wp.start_date,
            due_date: wp.due_date,
            duration: wp.duration,
            lock_version: wp.lock_version,
        }
    }
}

fn parse_work_package_page(body: &str) -> Result<WorkPackagePage, SyncError> {
    let collection: Collection<WorkPackageElement> = parse_json(body, "work package list")?;
    Ok(WorkPackagePage {
        total: collection.total,
        count: collection.count,
        elements: collection
            .embedded
            .elements
            .into_iter()
            .map(ExportedWorkPackage::from)
            .collect(),
    })
}

#[async_trait]
impl OpenProjectApi for OpenProjectClient {
    async fn create_user(&self, user: &UserRecord) -> Result<Created, SyncError> {
        let url = resource_url(&self.base_url, Resource::Users);
        let body = self
            .send(reqwest::Method::POST, &url, Some(&user_payload(user)), CREATED)
            .await?;
        Ok(parse_created(&body))
    }

    async fn update_group_members(&self, update: &GroupMembershipUpdate) -> Result<(), SyncError> {
        let url = item_url(&self.base_url, Resource::Groups, update.group_id);
        self.send(
            reqwest::Method::PATCH,
            &url,
            Some(&group_members_payload(update)),
            UPDATED,
        )
        .await?;
        Ok(())
    }

    async fn list_groups(&self) -> Result<Vec<GroupSummary>, SyncError> {
        let url = resource_url(&self.base_url, Resource::Groups);
        let body = self
            .send::<()>(reqwest::Method::GET, &url, None, FETCHED)
            .await?;
        parse_groups(&body)
    }

    async fn create_work_package(&self, record: &WorkPackageRecord) -> Result<Created, SyncError> {
        let url = resource_url(&self.base_url, Resource::WorkPackages);
        let body = self
            .send(
                reqwest::Method::POST,
                &url,
                Some(&work_package_payload(record)),
                CREATED,
            )
            .await?;
        Ok(parse_created(&body))
    }

    async fn patch_parent(&self, patch: &ParentPatchRecord) -> Result<Option<i64>, SyncError> {
        let url = item_url(&self.base_url, Resource::WorkPackages, patch.work_package_id);
        let body = self
            .send(
                reqwest::Method::PATCH,
                &url,
                Some(&parent_patch_payload(patch)),
                UPDATED,
            )
            .await?;
        // A lockVersion we cannot read is not a failed patch.
        Ok(parse_created(&body).lock_version)
    }

    async fn list_work_packages(
        &self,
        offset: u32,
        page_size: u32,
    ) -> Result<WorkPackagePage, SyncError> {
        let url = list_url(
            &self.base_url,
            Resource::WorkPackages,
            Some(offset),
            Some(page_size),
        );
        let body = self
            .send::<()>(reqwest::Method::GET, &url, None, FETCHED)
            .await?;
        parse_work_package_page(&body)
    }
}
