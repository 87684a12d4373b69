//! # Order Validator
//!
//! Turns a raw order request into a priced [`OrderCreate`] or rejects it.
//!
//! Rules, checked in this order:
//! 1. the item list is not empty,
//! 2. the customer name is not blank,
//! 3. every quantity is positive,
//! 4. the summed quantity of the whole order fits in a `u32`,
//! 5. duplicate menu item ids are merged by summing their quantities,
//! 6. every merged id resolves in the catalog (one batch lookup).
//!
//! ## Rounding
//! The total is `round2(Σ unit_price × quantity)` where `round2` rounds
//! half away from zero at the second decimal. Totals are never negative, so
//! this is round-half-up: `0.125 → 0.13`.
//!
//! The validator has no side effects. Storing and queueing the order is the
//! caller's job.

use crate::clients::MenuClient;
use crate::menu_store::MenuError;
use crate::model::{MenuItem, MenuItemId, OrderCreate, OrderLine};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;
use tracing::{debug, instrument, warn};

/// One requested line, as sent by a client.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemRequest {
    pub menu_item_id: MenuItemId,
    pub quantity: i32,
}

#[derive(Debug, Clone, Error, PartialEq)]
pub enum ValidationError {
    #[error("Empty order")]
    EmptyOrder,

    #[error("Missing customerName")]
    MissingCustomerName,

    #[error("Quantity must be > 0")]
    NonPositiveQuantity,

    #[error("Quantity too large")]
    QuantityOverflow,

    #[error("Invalid menu item id included")]
    UnknownMenuItem,

    /// The catalog could not be read; the request itself may be fine.
    #[error("Menu unavailable: {0}")]
    CatalogUnavailable(MenuError),
}

/// Validates and prices orders against the menu store.
#[derive(Clone)]
pub struct OrderValidator {
    menu: MenuClient,
}

impl OrderValidator {
    pub fn new(menu: MenuClient) -> Self {
        Self { menu }
    }

    #[instrument(skip(self, items), fields(lines = items.len()))]
    pub async fn validate(
        &self,
        customer_name: &str,
        customer_phone: Option<String>,
        items: &[ItemRequest],
    ) -> Result<OrderCreate, ValidationError> {
        let merged = merge_items(customer_name, items)?;
        let ids: Vec<MenuItemId> = merged.iter().map(|(id, _)| *id).collect();

        let found = self
            .menu
            .find_all_by_id(ids)
            .await
            .map_err(ValidationError::CatalogUnavailable)?;
        if found.len() != merged.len() {
            warn!(requested = merged.len(), found = found.len(), "Unknown menu item in order");
            return Err(ValidationError::UnknownMenuItem);
        }

        let (lines, total) = price_lines(&merged, &found)?;
        debug!(total, "Order priced");
        Ok(OrderCreate {
            customer_name: customer_name.trim().to_string(),
            customer_phone: customer_phone.filter(|p| !p.trim().is_empty()),
            lines,
            total,
        })
    }
}

/// Checks the request shape and merges duplicate ids, keeping first-seen order.
pub fn merge_items(
    customer_name: &str,
    items: &[ItemRequest],
) -> Result<Vec<(MenuItemId, u32)>, ValidationError> {
    if items.is_empty() {
        return Err(ValidationError::EmptyOrder);
    }
    if customer_name.trim().is_empty() {
        return Err(ValidationError::MissingCustomerName);
    }

    let mut merged: Vec<(MenuItemId, u32)> = Vec::with_capacity(items.len());
    let mut position: HashMap<MenuItemId, usize> = HashMap::new();
    let mut units: u32 = 0;
    for item in items {
        let quantity = u32::try_from(item.quantity)
            .ok()
            .filter(|q| *q > 0)
            .ok_or(ValidationError::NonPositiveQuantity)?;
        // Bounds every line as well, since no line exceeds the order total.
        units = units
            .checked_add(quantity)
            .ok_or(ValidationError::QuantityOverflow)?;
        match position.get(&item.menu_item_id) {
            Some(&i) => merged[i].1 += quantity,
            None => {
                position.insert(item.menu_item_id, merged.len());
                merged.push((item.menu_item_id, quantity));
            }
        }
    }
    Ok(merged)
}

/// Snapshots each menu item into a line and returns the rounded total.
pub fn price_lines(
    merged: &[(MenuItemId, u32)],
    menu: &[MenuItem],
) -> Result<(Vec<OrderLine>, f64), ValidationError> {
    let by_id: HashMap<MenuItemId, &MenuItem> = menu.iter().map(|m| (m.id, m)).collect();
    let lines = merged
        .iter()
        .map(|(id, quantity)| {
            let item = by_id.get(id).ok_or(ValidationError::UnknownMenuItem)?;
            Ok(OrderLine {
                menu_item_id: item.id,
                name: item.name.clone(),
                quantity: *quantity,
                unit_price: item.price,
            })
        })
        .collect::<Result<Vec<_>, ValidationError>>()?;
    let total = round2(lines.iter().map(OrderLine::subtotal).sum());
    Ok((lines, total))
}

/// Rounds to two decimals, halves away from zero.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
