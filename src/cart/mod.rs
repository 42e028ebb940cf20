//! Client-side cache of the server-owned cart.
//!
//! The server is the source of truth; this cache is rebuilt from the
//! cart endpoint payload after every mutating operation. Quantities are
//! never held or displayed below 1.

use crate::models::CartPayload;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CartItem {
    pub item_id: i64,
    pub product_id: i64,
    pub name: String,
    /// Unit price in pesos, derived from the line subtotal.
    pub unit_price: i64,
    pub quantity: u32,
    pub variant: Option<String>,
    pub image: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct Cart {
    items: Vec<CartItem>,
}

impl Cart {
    /// Empty cart; what an anonymous session always holds.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Rebuild from the cart endpoint payload. The serializer hands back
    /// line subtotals, so the unit price is recovered by division; the
    /// quantity floor keeps that well-defined.
    pub fn from_payload(payload: &CartPayload) -> Self {
        let items = payload
            .items
            .iter()
            .map(|item| {
                let quantity = item.cantidad.max(1);
                CartItem {
                    item_id: item.id,
                    product_id: item.producto,
                    name: item
                        .producto_nombre
                        .clone()
                        .unwrap_or_else(|| "Producto".to_string()),
                    unit_price: item.subtotal.unwrap_or(0) / quantity as i64,
                    quantity,
                    variant: item.variante.as_ref().and_then(|v| v.nombre.clone()),
                    image: item.imagen.clone(),
                }
            })
            .collect();
        Self { items }
    }

    pub fn items(&self) -> &[CartItem] {
        &self.items
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Total in pesos: sum of unit price × quantity over current items.
    pub fn total(&self) -> i64 {
        self.items
            .iter()
            .map(|item| item.unit_price * item.quantity as i64)
            .sum()
    }

    pub fn total_items(&self) -> u32 {
        self.items.iter().map(|item| item.quantity).sum()
    }
}

/// Clamp a requested line quantity before it is sent to the server.
/// Zero or negative requests become 1; the invariant is enforced on the
/// way out, not after the fact.
pub fn normalize_quantity(requested: i64) -> u32 {
    requested.max(1) as u32
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payload(json: serde_json::Value) -> CartPayload {
        serde_json::from_value(json).unwrap()
    }

    #[test]
    fn test_total_is_sum_of_unit_price_times_quantity() {
        let cart = Cart::from_payload(&payload(serde_json::json!({
            "items": [
                { "id": 1, "producto": 10, "producto_nombre": "Polera", "subtotal": 25980, "cantidad": 2 },
                { "id": 2, "producto": 11, "producto_nombre": "Pompones", "subtotal": 8990, "cantidad": 1 }
            ]
        })));
        assert_eq!(cart.items()[0].unit_price, 12990);
        assert_eq!(cart.total(), 25980 + 8990);
        assert_eq!(cart.total_items(), 3);
    }

    #[test]
    fn test_quantity_never_below_one() {
        let cart = Cart::from_payload(&payload(serde_json::json!({
            "items": [
                { "id": 1, "producto": 10, "subtotal": 5000, "cantidad": 0 }
            ]
        })));
        assert_eq!(cart.items()[0].quantity, 1);
        assert_eq!(cart.total(), 5000);

        assert_eq!(normalize_quantity(0), 1);
        assert_eq!(normalize_quantity(-3), 1);
        assert_eq!(normalize_quantity(4), 4);
    }

    #[test]
    fn test_anonymous_cart_is_empty() {
        let cart = Cart::empty();
        assert!(cart.is_empty());
        assert_eq!(cart.total(), 0);
        assert_eq!(cart.total_items(), 0);
    }

    #[test]
    fn test_variant_and_fallback_name() {
        let cart = Cart::from_payload(&payload(serde_json::json!({
            "items": [
                { "id": 1, "producto": 10, "subtotal": 12990, "cantidad": 1,
                  "variante": { "nombre": "M" } }
            ]
        })));
        assert_eq!(cart.items()[0].name, "Producto");
        assert_eq!(cart.items()[0].variant.as_deref(), Some("M"));
    }
}
