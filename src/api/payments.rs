//! Payment endpoints: matriculation, recurring obligations, the Webpay
//! init/confirm pairs, saved cards, and batch autopay.

use serde_json::json;

use crate::http::{ApiError, HttpClient};
use crate::models::{
    AutopayOutcome, Debt, MatriculaCreated, MatriculaPeriod, MatriculaRequest, Obligation,
    SavedCard, WebpayConfirmation, WebpayInit,
};

pub async fn register_matricula(
    http: &HttpClient,
    request: &MatriculaRequest,
) -> Result<MatriculaCreated, ApiError> {
    http.post("pagos/matriculas/", request).await
}

pub async fn matricula_periods(http: &HttpClient) -> Result<Vec<MatriculaPeriod>, ApiError> {
    http.get("pagos/periodos-matricula/").await
}

pub async fn my_debts(http: &HttpClient) -> Result<Vec<Debt>, ApiError> {
    http.get("pagos/deudas/mis-deudas/").await
}

// -- Matriculation Webpay -------------------------------------------------

pub async fn init_webpay(
    http: &HttpClient,
    matricula_id: i64,
    monto: i64,
    buy_order: &str,
    session_id: &str,
) -> Result<WebpayInit, ApiError> {
    http.post(
        "pagos/webpay/init/",
        &json!({
            "matricula_id": matricula_id,
            "monto": monto,
            "buy_order": buy_order,
            "session_id": session_id,
        }),
    )
    .await
}

pub async fn confirm_webpay(http: &HttpClient, token: &str) -> Result<WebpayConfirmation, ApiError> {
    http.post("pagos/webpay/confirmar/", &json!({ "token": token }))
        .await
}

// -- Recurring obligations ------------------------------------------------

pub async fn my_obligations(http: &HttpClient) -> Result<Vec<Obligation>, ApiError> {
    http.get("pagos/online-obligaciones/").await
}

pub async fn init_webpay_online(
    http: &HttpClient,
    obligacion_id: i64,
    buy_order: &str,
    session_id: &str,
) -> Result<WebpayInit, ApiError> {
    http.post(
        "pagos/online/webpay/init/",
        &json!({
            "obligacion_id": obligacion_id,
            "buy_order": buy_order,
            "session_id": session_id,
        }),
    )
    .await
}

pub async fn confirm_webpay_online(
    http: &HttpClient,
    token: &str,
) -> Result<WebpayConfirmation, ApiError> {
    http.post("pagos/online/webpay/confirmar/", &json!({ "token": token }))
        .await
}

// -- Saved cards and autopay ----------------------------------------------

pub async fn my_cards(http: &HttpClient) -> Result<Vec<SavedCard>, ApiError> {
    http.get("pagos/tarjetas/").await
}

pub async fn create_card(http: &HttpClient, card: &crate::models::NewCard) -> Result<SavedCard, ApiError> {
    http.post("pagos/tarjetas/", card).await
}

pub async fn update_card(
    http: &HttpClient,
    card_id: i64,
    autopago: Option<bool>,
    por_defecto: Option<bool>,
) -> Result<SavedCard, ApiError> {
    let mut body = serde_json::Map::new();
    if let Some(v) = autopago {
        body.insert("autopago".to_string(), json!(v));
    }
    if let Some(v) = por_defecto {
        body.insert("por_defecto".to_string(), json!(v));
    }
    http.patch(&format!("pagos/tarjetas/{}/", card_id), &body)
        .await
}

pub async fn delete_card(http: &HttpClient, card_id: i64) -> Result<(), ApiError> {
    http.delete(&format!("pagos/tarjetas/{}/", card_id)).await
}

/// Charge one obligation against a stored card, no redirect cycle.
pub async fn pay_with_card(
    http: &HttpClient,
    obligacion_id: i64,
    card_id: i64,
) -> Result<WebpayConfirmation, ApiError> {
    http.post(
        &format!("pagos/online-obligaciones/{}/pagar-con-tarjeta/", obligacion_id),
        &json!({ "card_id": card_id }),
    )
    .await
}

/// Batch-charge every eligible obligation against the default autopay
/// card; returns how many were paid.
pub async fn autopay(http: &HttpClient) -> Result<AutopayOutcome, ApiError> {
    http.post("pagos/online-obligaciones/autopagar/", &json!({}))
        .await
}
