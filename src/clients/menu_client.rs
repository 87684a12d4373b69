use crate::clients::actor_client::ActorClient;
use crate::framework::{FrameworkError, ResourceClient};
use crate::menu_store::MenuError;
use crate::model::{MenuItem, MenuItemCreate, MenuItemId, MenuQuery};
use async_trait::async_trait;
use tracing::{debug, instrument};

/// Client for the read-mostly menu store.
#[derive(Clone)]
pub struct MenuClient {
    inner: ResourceClient<MenuItem>,
}

impl MenuClient {
    pub fn new(inner: ResourceClient<MenuItem>) -> Self {
        Self { inner }
    }

    /// Adds an item to the catalog. Only used while seeding.
    #[instrument(skip(self))]
    pub async fn create_item(&self, params: MenuItemCreate) -> Result<MenuItem, MenuError> {
        debug!("Sending request");
        self.inner.create(params).await.map_err(Self::map_error)
    }

    /// Seeds the catalog if it is still empty. Returns the number of items added.
    pub async fn seed(&self, items: Vec<MenuItemCreate>) -> Result<usize, MenuError> {
        if !self.find_all().await?.is_empty() {
            return Ok(0);
        }
        let mut added = 0;
        for item in items {
            self.create_item(item).await?;
            added += 1;
        }
        Ok(added)
    }

    pub async fn find_all(&self) -> Result<Vec<MenuItem>, MenuError> {
        self.query(MenuQuery::All).await
    }

    pub async fn find_by_category(&self, category: &str) -> Result<Vec<MenuItem>, MenuError> {
        self.query(MenuQuery::Category(category.to_string())).await
    }

    pub async fn find_all_by_id(&self, ids: Vec<MenuItemId>) -> Result<Vec<MenuItem>, MenuError> {
        self.get_many(ids).await
    }
}

#[async_trait]
impl ActorClient<MenuItem> for MenuClient {
    type Error = MenuError;

    fn inner(&self) -> &ResourceClient<MenuItem> {
        &self.inner
    }

    fn map_error(e: FrameworkError) -> Self::Error {
        if let Some(menu_error) = e.entity_error::<MenuError>() {
            return menu_error.clone();
        }
        MenuError::ActorCommunicationError(e.to_string())
    }
}
