//! [`ActorEntity`] implementation for [`MenuItem`].
//!
//! Menu items are seeded through `Create` and never change afterwards, so
//! updates and actions are refused.

use super::MenuError;
use crate::framework::ActorEntity;
use crate::model::{MenuItem, MenuItemCreate, MenuItemId, MenuQuery};
use async_trait::async_trait;

#[async_trait]
impl ActorEntity for MenuItem {
    type Id = MenuItemId;
    type Create = MenuItemCreate;
    type Update = ();
    type Action = ();
    type ActionResult = ();
    type Query = MenuQuery;
    type Context = ();
    type Error = MenuError;

    fn from_create_params(id: MenuItemId, params: MenuItemCreate) -> Result<Self, MenuError> {
        if params.name.trim().is_empty() {
            return Err(MenuError::InvalidItem("name is blank".into()));
        }
        if !params.price.is_finite() || params.price < 0.0 {
            return Err(MenuError::InvalidItem(format!("price {}", params.price)));
        }
        Ok(MenuItem::new(id, params.name, params.description, params.price, params.category))
    }

    fn matches(&self, query: &MenuQuery) -> bool {
        match query {
            MenuQuery::All => true,
            MenuQuery::Category(category) => self.category == *category,
        }
    }

    async fn on_update(&mut self, _update: (), _ctx: &()) -> Result<(), MenuError> {
        Err(MenuError::ReadOnly)
    }

    async fn handle_action(&mut self, _action: (), _ctx: &()) -> Result<(), MenuError> {
        Err(MenuError::ReadOnly)
    }
}
