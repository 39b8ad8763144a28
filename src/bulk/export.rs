use tracing::debug;

use crate::api::OpenProjectApi;
use crate::error::SyncError;
use crate::model::work_package::ExportedWorkPackage;

pub const DEFAULT_PAGE_SIZE: u32 = 100;

/// Walk the work package listing page by page. `offset` is the 1-based page
/// number; the walk ends on an empty page or once `total` elements arrived.
/// The server may cap `pageSize`, so progress is measured in elements received.
pub async fn fetch_all_work_packages(
    api: &dyn OpenProjectApi,
    page_size: u32,
) -> Result<Vec<ExportedWorkPackage>, SyncError> {
    let page_size = page_size.max(1);
    let mut all = Vec::new();
    let mut offset = 1;

    loop {
        let page = api.list_work_packages(offset, page_size).await?;
        let fetched = page.elements.len();
        debug!(offset, count = page.count, total = page.total, "fetched work package page");
        all.extend(page.elements);

        if fetched == 0 || all.len() as u64 >= page.total {
            break;
        }
        offset += 1;
    }

    Ok(all)
}
