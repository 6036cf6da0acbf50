//! Catalog port: project schema and the identity the triager acts as.

use async_trait::async_trait;

use crate::domain::{ProjectSchema, ServiceError, User};

#[async_trait]
pub trait Catalog: Send + Sync {
    /// Sections and custom field definitions of a project, looked up by name or gid.
    async fn project(&self, project: &str) -> Result<ProjectSchema, ServiceError>;

    /// The user whose token the triager runs with.
    async fn current_user(&self) -> Result<User, ServiceError>;
}
