//! Order drafting and wholesale save for the food-order portal
//!
//! One order row per user: a map from product name to quantity plus a
//! computed total, replaced entirely on every save. There is no line-item
//! diffing and no server-side cart; the draft below is the cart.

use chrono::Utc;
use std::collections::BTreeMap;
use uuid::Uuid;

use crate::error::Error;
use crate::models::{Order, Product, Profile};
use crate::profile::{missing_fields, profile_gate, ProfileGate};
use crate::Backend;

/// Flat processing fee added to every order's subtotal
pub const PROCESSING_FEE: f64 = 15.0;

/// The in-progress order: product name to quantity
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OrderDraft {
    items: BTreeMap<String, u32>,
}

impl OrderDraft {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the draft from a previously saved order
    pub fn from_saved(order: &Order) -> Self {
        Self {
            items: order.order_items.clone(),
        }
    }

    /// Set a product's quantity, clamped to its maximum; zero removes the
    /// line entirely
    pub fn set_quantity(&mut self, product: &Product, quantity: u32) {
        let quantity = quantity.min(product.max_quantity);
        if quantity == 0 {
            self.items.remove(&product.name);
        } else {
            self.items.insert(product.name.clone(), quantity);
        }
    }

    /// Quantity currently drafted for a product name
    pub fn quantity(&self, product_name: &str) -> u32 {
        self.items.get(product_name).copied().unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Sum of price × quantity over the active product list. Drafted names
    /// that no longer match an active product contribute nothing.
    pub fn subtotal(&self, products: &[Product]) -> f64 {
        self.items
            .iter()
            .filter_map(|(name, qty)| {
                products
                    .iter()
                    .find(|p| &p.name == name)
                    .map(|p| p.price * f64::from(*qty))
            })
            .sum()
    }

    /// Subtotal plus the flat processing fee
    pub fn total(&self, products: &[Product]) -> f64 {
        self.subtotal(products) + PROCESSING_FEE
    }

    fn into_order(self, user_id: Uuid, products: &[Product]) -> Order {
        let total_cost = self.total(products);
        Order {
            user_id,
            order_items: self.items,
            total_cost,
            updated_at: Some(Utc::now()),
        }
    }
}

/// Active products for the order page, grouped by category then name
pub async fn fetch_active_products(backend: &Backend) -> Result<Vec<Product>, Error> {
    backend
        .from("products")
        .select("*")
        .eq("is_active", true)
        .order("category", true)
        .order("name", true)
        .execute::<Product>()
        .await
}

/// The user's saved order, if any; absence means an empty draft
pub async fn fetch_order(backend: &Backend, user_id: Uuid) -> Result<Option<Order>, Error> {
    backend
        .from("orders")
        .select("*")
        .eq("user_id", user_id)
        .execute_one::<Order>()
        .await
}

/// Save a draft as the user's one order row, upserted wholesale.
///
/// Requires a complete profile; an incomplete one is rejected before any
/// remote call so the page can prompt and redirect instead.
pub async fn save_order(
    backend: &Backend,
    profile: &Profile,
    draft: OrderDraft,
    products: &[Product],
) -> Result<(), Error> {
    if let ProfileGate::Incomplete { .. } = profile_gate(profile) {
        return Err(Error::validation(format!(
            "Profile incomplete; missing: {}",
            missing_fields(profile).join(", ")
        )));
    }

    let order = draft.into_order(profile.id, products);

    backend
        .from("orders")
        .upsert(order)
        .on_conflict("user_id")
        .execute_no_return()
        .await
}

#[cfg(test)]
mod tests {
    use super::*;

    fn product(name: &str, price: f64, max_quantity: u32) -> Product {
        Product {
            id: 1,
            name: name.into(),
            description: None,
            price,
            category: "Pantry".into(),
            max_quantity,
            is_active: true,
        }
    }

    #[test]
    fn quantity_is_clamped_to_product_maximum() {
        let flour = product("Flour", 4.5, 4);
        let mut draft = OrderDraft::new();
        draft.set_quantity(&flour, 9);
        assert_eq!(draft.quantity("Flour"), 4);
    }

    #[test]
    fn zero_quantity_removes_the_line() {
        let flour = product("Flour", 4.5, 4);
        let mut draft = OrderDraft::new();
        draft.set_quantity(&flour, 2);
        draft.set_quantity(&flour, 0);
        assert!(draft.is_empty());
    }

    #[test]
    fn total_is_subtotal_plus_processing_fee() {
        let products = vec![product("Flour", 4.5, 4), product("Oil", 8.0, 2)];
        let mut draft = OrderDraft::new();
        draft.set_quantity(&products[0], 2);
        draft.set_quantity(&products[1], 1);

        assert_eq!(draft.subtotal(&products), 17.0);
        assert_eq!(draft.total(&products), 17.0 + PROCESSING_FEE);
    }

    #[test]
    fn stale_product_names_contribute_nothing() {
        let products = vec![product("Flour", 4.5, 4)];
        let discontinued = product("Matzo", 12.0, 4);
        let mut draft = OrderDraft::new();
        draft.set_quantity(&discontinued, 1);

        assert_eq!(draft.subtotal(&products), 0.0);
    }
}
