//! ItemSource port: fetches the snapshot a triage run works on.

use async_trait::async_trait;

use crate::domain::{Item, ProjectId, ServiceError};

#[async_trait]
pub trait ItemSource: Send + Sync {
    /// All items of a project, memberships, custom fields and stories included.
    ///
    /// The returned order is the snapshot order used for dispatch.
    async fn fetch_items(&self, project: &ProjectId) -> Result<Vec<Item>, ServiceError>;
}
