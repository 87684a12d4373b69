use crate::framework::{ActorEntity, FrameworkError, ResourceClient};
use async_trait::async_trait;

/// Trait for store-specific clients to inherit the read operations.
///
/// Every store is read the same way (by id, by a set of ids, by a filter),
/// so those live here once and each client only adds its own writes.
#[async_trait]
pub trait ActorClient<T: ActorEntity>: Send + Sync {
    /// The store-specific error type.
    type Error: From<String> + Send + Sync;

    /// Access the inner generic ResourceClient.
    fn inner(&self) -> &ResourceClient<T>;

    /// Map framework errors to the store-specific error type.
    fn map_error(e: FrameworkError) -> Self::Error;

    /// Fetch a record by id (`findById`).
    #[tracing::instrument(skip(self))]
    async fn get(&self, id: T::Id) -> Result<Option<T>, Self::Error> {
        tracing::debug!("Sending request");
        self.inner().get(id).await.map_err(Self::map_error)
    }

    /// Fetch every record whose id resolves (`findAllById`). Unknown ids are skipped.
    #[tracing::instrument(skip(self))]
    async fn get_many(&self, ids: Vec<T::Id>) -> Result<Vec<T>, Self::Error> {
        tracing::debug!("Sending request");
        self.inner().get_many(ids).await.map_err(Self::map_error)
    }

    /// Fetch every record selected by `query`.
    #[tracing::instrument(skip(self))]
    async fn query(&self, query: T::Query) -> Result<Vec<T>, Self::Error> {
        tracing::debug!("Sending request");
        self.inner().query(query).await.map_err(Self::map_error)
    }
}
