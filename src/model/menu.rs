use serde::{Deserialize, Serialize};

/// Menu item identifier, assigned by the menu store.
pub type MenuItemId = u64;

/// A read-only catalog entry.
///
/// Seeded once at startup; the pipeline only ever reads it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MenuItem {
    pub id: MenuItemId,
    pub name: String,
    pub description: String,
    pub price: f64,
    pub category: String,
}

impl MenuItem {
    pub fn new(
        id: MenuItemId,
        name: impl Into<String>,
        description: impl Into<String>,
        price: f64,
        category: impl Into<String>,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            description: description.into(),
            price,
            category: category.into(),
        }
    }
}

/// Payload for seeding a menu item.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MenuItemCreate {
    pub name: String,
    pub description: String,
    pub price: f64,
    pub category: String,
}

impl MenuItemCreate {
    pub fn new(name: &str, description: &str, price: f64, category: &str) -> Self {
        Self {
            name: name.to_string(),
            description: description.to_string(),
            price,
            category: category.to_string(),
        }
    }
}

/// Menu lookups.
#[derive(Debug, Clone)]
pub enum MenuQuery {
    All,
    Category(String),
}

/// The house menu the demo binary and integration tests start with.
pub fn default_menu() -> Vec<MenuItemCreate> {
    vec![
        MenuItemCreate::new("Margherita Pizza", "Classic cheese & tomato", 7.99, "pizza"),
        MenuItemCreate::new("BBQ Chicken Pizza", "Chicken, BBQ sauce, cheese", 9.99, "pizza"),
        MenuItemCreate::new("Veggie Burger", "Patty with fresh veggies", 6.49, "burger"),
        MenuItemCreate::new("Cheeseburger", "Beef patty with cheddar", 7.49, "burger"),
        MenuItemCreate::new("French Fries", "Crispy golden fries", 2.99, "sides"),
        MenuItemCreate::new("Caesar Salad", "Crisp romaine & Caesar dressing", 4.99, "salad"),
    ]
}
