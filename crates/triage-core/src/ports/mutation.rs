//! MutationService port: applies one resolved mutation to one item.

use async_trait::async_trait;

use crate::domain::{ItemId, Mutation, ServiceError};

/// Errors carry an [`ErrorKind`](crate::domain::ErrorKind):
/// transient failures abort the run, the others skip the mutation.
#[async_trait]
pub trait MutationService: Send + Sync {
    async fn apply(&self, item: &ItemId, mutation: &Mutation) -> Result<(), ServiceError>;
}
