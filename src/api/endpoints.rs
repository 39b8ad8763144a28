use std::fmt;

pub const API_PREFIX: &str = "/api/v3";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resource {
    Users,
    Groups,
    WorkPackages,
}

impl Resource {
    pub fn as_str(self) -> &'static str {
        match self {
            Resource::Users => "users",
            Resource::Groups => "groups",
            Resource::WorkPackages => "work_packages",
        }
    }
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

pub fn resource_url(base_url: &str, resource: Resource) -> String {
    format!("{}{API_PREFIX}/{resource}", base_url.trim_end_matches('/'))
}

pub fn item_url(base_url: &str, resource: Resource, id: i64) -> String {
    format!("{}/{id}", resource_url(base_url, resource))
}

/// Listing URL. Parameters are rendered `offset` first, absent ones skipped.
pub fn list_url(
    base_url: &str,
    resource: Resource,
    offset: Option<u32>,
    page_size: Option<u32>,
) -> String {
    let mut params = Vec::with_capacity(2);
    if let Some(offset) = offset {
        params.push(format!("offset={offset}"));
    }
    if let Some(page_size) = page_size {
        params.push(format!("pageSize={page_size}"));
    }

    let url = resource_url(base_url, resource);
    if params.is_empty() {
        url
    } else {
        format!("{url}?{}", params.join("&"))
    }
}
