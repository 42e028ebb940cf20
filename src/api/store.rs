//! Store endpoints: products, the server-owned cart, and orders with
//! their Webpay pair.
//!
//! Cart quantities are clamped to at least 1 before any request leaves
//! the client; the server never sees a smaller value.

use serde_json::json;

use crate::http::{ApiError, HttpClient};
use crate::models::{CartPayload, Order, Product, WebpayConfirmation, WebpayInit};

pub async fn products(http: &HttpClient) -> Result<Vec<Product>, ApiError> {
    http.get("tienda/productos/").await
}

pub async fn cart(http: &HttpClient) -> Result<CartPayload, ApiError> {
    http.get("tienda/carrito/").await
}

pub async fn add_to_cart(
    http: &HttpClient,
    producto_id: i64,
    cantidad: u32,
    talla: Option<&str>,
) -> Result<(), ApiError> {
    let _: serde_json::Value = http
        .post(
            "tienda/carrito/agregar/",
            &json!({
                "producto_id": producto_id,
                "cantidad": cantidad.max(1),
                "talla": talla,
            }),
        )
        .await?;
    Ok(())
}

pub async fn update_cart_item(
    http: &HttpClient,
    item_id: i64,
    cantidad: u32,
) -> Result<(), ApiError> {
    let _: serde_json::Value = http
        .patch(
            &format!("tienda/carrito/actualizar/{}/", item_id),
            &json!({ "cantidad": cantidad.max(1) }),
        )
        .await?;
    Ok(())
}

pub async fn remove_cart_item(http: &HttpClient, item_id: i64) -> Result<(), ApiError> {
    http.delete(&format!("tienda/carrito/eliminar/{}/", item_id))
        .await
}

/// Create an order from the current cart contents.
pub async fn create_order(http: &HttpClient, notas_cliente: &str) -> Result<Order, ApiError> {
    http.post("tienda/pedidos/", &json!({ "notas_cliente": notas_cliente }))
        .await
}

pub async fn my_orders(http: &HttpClient) -> Result<Vec<Order>, ApiError> {
    http.get("tienda/pedidos/").await
}

/// The store init takes no client buy-order; the server generates one.
pub async fn init_order_webpay(http: &HttpClient, pedido_id: i64) -> Result<WebpayInit, ApiError> {
    http.post(
        &format!("tienda/pedidos/{}/webpay/init/", pedido_id),
        &json!({}),
    )
    .await
}

pub async fn confirm_order_webpay(
    http: &HttpClient,
    token: &str,
) -> Result<WebpayConfirmation, ApiError> {
    http.post("tienda/pedidos/webpay/confirmar/", &json!({ "token": token }))
        .await
}
