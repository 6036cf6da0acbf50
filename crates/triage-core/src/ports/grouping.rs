//! GroupingService port: section contents and in-section ordering.

use async_trait::async_trait;

use crate::domain::{Item, ItemId, Placement, ProjectId, SectionId, ServiceError};

#[async_trait]
pub trait GroupingService: Send + Sync {
    /// Items of a section in their current display order.
    async fn list_items(&self, section: &SectionId) -> Result<Vec<Item>, ServiceError>;

    /// Move `item` next to another item of the same section.
    async fn reorder(
        &self,
        project: &ProjectId,
        item: &ItemId,
        placement: &Placement,
    ) -> Result<(), ServiceError>;
}
