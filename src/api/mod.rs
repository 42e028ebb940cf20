//! Domain service modules: thin typed wrappers over the HTTP adapter,
//! one per backend resource. Every function returns
//! `Result<T, ApiError>`; callers branch, nothing here panics or
//! retries on its own.

pub mod athletes;
pub mod auth;
pub mod notifications;
pub mod payments;
pub mod schedules;
pub mod store;
pub mod users;

#[cfg(test)]
mod tests {
    use crate::config::ApiConfig;
    use crate::http::HttpClient;
    use crate::models::NewCard;
    use crate::shell::{HeadlessShell, Shell};
    use crate::storage::{MemoryStorage, Storage};
    use axum::routing::{delete, get, patch, post};
    use axum::{Json, Router};
    use std::sync::Arc;

    use super::*;

    async fn client(router: Router) -> HttpClient {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        HttpClient::new(
            &ApiConfig {
                base_url: format!("http://{}", addr),
                timeout_secs: 5,
            },
            Arc::new(MemoryStorage::new()) as Arc<dyn Storage>,
            Arc::new(HeadlessShell::new("/")) as Arc<dyn Shell>,
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_my_athletes_deserializes() {
        let router = Router::new().route(
            "/api/atletas/mis-atletas/",
            get(|| async {
                Json(serde_json::json!([
                    { "id": 1, "nombre": "Sofía", "division": "Mini", "estado": "activo" }
                ]))
            }),
        );
        let http = client(router).await;
        let athletes = athletes::my_athletes(&http).await.unwrap();
        assert_eq!(athletes.len(), 1);
        assert_eq!(athletes[0].nombre, "Sofía");
    }

    #[tokio::test]
    async fn test_my_schedule_deserializes() {
        let router = Router::new().route(
            "/api/horarios/mis-horarios/",
            get(|| async {
                Json(serde_json::json!([
                    { "id": 3, "dia": "martes", "hora_inicio": "18:00", "hora_fin": "19:30",
                      "equipo_nombre": "Mini Stars" }
                ]))
            }),
        );
        let http = client(router).await;
        let entries = schedules::my_schedule(&http).await.unwrap();
        assert_eq!(entries[0].equipo_nombre.as_deref(), Some("Mini Stars"));
    }

    #[tokio::test]
    async fn test_notifications_and_mark_read() {
        let router = Router::new()
            .route(
                "/api/notificaciones/",
                get(|| async {
                    Json(serde_json::json!([
                        { "id": 8, "titulo": "Cuota pendiente", "leida": false }
                    ]))
                }),
            )
            .route(
                "/api/notificaciones/8/marcar-leida/",
                patch(|| async { Json(serde_json::json!({ "id": 8, "leida": true })) }),
            )
            .route(
                "/api/notificaciones/no-leidas/count/",
                get(|| async { Json(serde_json::json!({ "count": 1 })) }),
            );
        let http = client(router).await;

        let list = notifications::my_notifications(&http).await.unwrap();
        assert!(!list[0].leida);
        notifications::mark_read(&http, 8).await.unwrap();
        assert_eq!(notifications::unread_count(&http).await.unwrap().count, 1);
    }

    #[tokio::test]
    async fn test_cart_mutations_clamp_quantity_before_sending() {
        let router = Router::new()
            .route(
                "/api/tienda/carrito/agregar/",
                post(|Json(body): Json<serde_json::Value>| async move {
                    assert_eq!(body["cantidad"], 1);
                    Json(serde_json::json!({}))
                }),
            )
            .route(
                "/api/tienda/carrito/actualizar/4/",
                patch(|Json(body): Json<serde_json::Value>| async move {
                    assert_eq!(body["cantidad"], 1);
                    Json(serde_json::json!({}))
                }),
            )
            .route(
                "/api/tienda/carrito/eliminar/4/",
                delete(|| async { axum::http::StatusCode::NO_CONTENT }),
            );
        let http = client(router).await;

        store::add_to_cart(&http, 10, 0, Some("M")).await.unwrap();
        store::update_cart_item(&http, 4, 0).await.unwrap();
        store::remove_cart_item(&http, 4).await.unwrap();
    }

    #[tokio::test]
    async fn test_order_creation_and_init() {
        let router = Router::new()
            .route(
                "/api/tienda/pedidos/",
                post(|Json(body): Json<serde_json::Value>| async move {
                    assert_eq!(body["notas_cliente"], "sin mangas");
                    Json(serde_json::json!({ "id": 70, "total": "25980.00", "estado": "pendiente" }))
                }),
            )
            .route(
                "/api/tienda/pedidos/70/webpay/init/",
                post(|| async { Json(serde_json::json!({ "url": "https://gw/t", "token": "k" })) }),
            );
        let http = client(router).await;

        let order = store::create_order(&http, "sin mangas").await.unwrap();
        assert_eq!(order.total, Some(25980));
        let init = store::init_order_webpay(&http, order.id).await.unwrap();
        assert_eq!(init.token, "k");
    }

    #[tokio::test]
    async fn test_saved_cards_roundtrip() {
        let router = Router::new()
            .route(
                "/api/pagos/tarjetas/",
                get(|| async {
                    Json(serde_json::json!([
                        { "id": 1, "marca": "Visa", "ultimos_digitos": "4242",
                          "autopago": true, "por_defecto": true }
                    ]))
                })
                .post(|Json(body): Json<serde_json::Value>| async move {
                    assert_eq!(body["marca"], "Visa");
                    Json(serde_json::json!({
                        "id": 2, "marca": "Visa", "ultimos_digitos": "1881",
                        "autopago": false, "por_defecto": false
                    }))
                }),
            )
            .route(
                "/api/pagos/tarjetas/2/",
                patch(|Json(body): Json<serde_json::Value>| async move {
                    assert_eq!(body["autopago"], true);
                    assert!(body.get("por_defecto").is_none());
                    Json(serde_json::json!({
                        "id": 2, "marca": "Visa", "ultimos_digitos": "1881",
                        "autopago": true, "por_defecto": false
                    }))
                })
                .delete(|| async { axum::http::StatusCode::NO_CONTENT }),
            )
            .route(
                "/api/pagos/online-obligaciones/9/pagar-con-tarjeta/",
                post(|Json(body): Json<serde_json::Value>| async move {
                    assert_eq!(body["card_id"], 2);
                    Json(serde_json::json!({ "estado": "pagado" }))
                }),
            );
        let http = client(router).await;

        let cards = payments::my_cards(&http).await.unwrap();
        assert!(cards[0].autopago && cards[0].por_defecto);

        let created = payments::create_card(
            &http,
            &NewCard {
                marca: "Visa".to_string(),
                ultimos_digitos: "1881".to_string(),
                autopago: false,
                por_defecto: false,
            },
        )
        .await
        .unwrap();
        assert_eq!(created.id, 2);

        let updated = payments::update_card(&http, 2, Some(true), None).await.unwrap();
        assert!(updated.autopago);

        let paid = payments::pay_with_card(&http, 9, 2).await.unwrap();
        assert_eq!(paid.estado.as_deref(), Some("pagado"));

        payments::delete_card(&http, 2).await.unwrap();
    }

    #[tokio::test]
    async fn test_obligations_and_periods() {
        let router = Router::new()
            .route(
                "/api/pagos/online-obligaciones/",
                get(|| async {
                    Json(serde_json::json!([
                        { "id": 9, "descripcion": "Mensualidad julio", "monto": 25000,
                          "fecha_vencimiento": "2026-07-05", "estado": "vencido" }
                    ]))
                }),
            )
            .route(
                "/api/pagos/periodos-matricula/",
                get(|| async {
                    Json(serde_json::json!([
                        { "id": 1, "estado": "activo", "monto": 50000 }
                    ]))
                }),
            );
        let http = client(router).await;

        let obligations = payments::my_obligations(&http).await.unwrap();
        assert_eq!(obligations[0].monto, Some(25000));

        let periods = payments::matricula_periods(&http).await.unwrap();
        assert!(periods[0].is_active());
        assert_eq!(periods[0].cost(), Some(50000));
    }

    #[tokio::test]
    async fn test_register_persists_tokens_only_when_present() {
        let router = Router::new().route(
            "/api/auth/register/",
            post(|| async {
                Json(serde_json::json!({
                    "user": {
                        "id": "2", "email": "n@b.com", "name": "Nico",
                        "role": "public", "createdAt": ""
                    }
                }))
            }),
        );
        let http = client(router).await;

        let registered = auth::register(&http, "n@b.com", "pw12345", "Nico", None)
            .await
            .unwrap();
        assert!(registered.access.is_none());
        // No auto-login token pair, so nothing was persisted.
        assert_eq!(http.storage().get(crate::storage::ACCESS_TOKEN_KEY), None);
    }

    #[tokio::test]
    async fn test_products_and_orders_listing() {
        let router = Router::new()
            .route(
                "/api/tienda/productos/",
                get(|| async {
                    Json(serde_json::json!([
                        { "id": 10, "nombre": "Polera oficial", "precio": "12990.00",
                          "categoria": "ropa", "nivel_acceso": "exclusivo" },
                        { "id": 11, "nombre": "Pompones", "precio": 8990 }
                    ]))
                }),
            )
            .route(
                "/api/tienda/pedidos/",
                get(|| async {
                    Json(serde_json::json!([
                        { "id": 70, "total": 25980, "estado": "pagado" }
                    ]))
                }),
            );
        let http = client(router).await;

        let products = store::products(&http).await.unwrap();
        assert_eq!(products[0].precio, 12990);
        assert!(products[0].is_exclusive());
        assert!(!products[1].is_exclusive());

        let orders = store::my_orders(&http).await.unwrap();
        assert_eq!(orders[0].estado.as_deref(), Some("pagado"));
    }

    #[tokio::test]
    async fn test_change_role_and_profile_update() {
        let router = Router::new()
            .route(
                "/api/usuarios/7/cambiar-rol/",
                patch(|Json(body): Json<serde_json::Value>| async move {
                    assert_eq!(body["role"], "entrenador");
                    Json(serde_json::json!({
                        "id": "7", "email": "c@b.com", "name": "Caro",
                        "role": "entrenador", "createdAt": ""
                    }))
                }),
            )
            .route(
                "/api/auth/me/",
                patch(|Json(body): Json<serde_json::Value>| async move {
                    assert_eq!(body["phone"], "+56922222222");
                    Json(serde_json::json!({
                        "id": "1", "email": "a@b.com", "name": "Ana",
                        "role": "apoderado", "phone": "+56922222222", "createdAt": ""
                    }))
                }),
            );
        let http = client(router).await;

        let changed = users::change_role(&http, "7", crate::models::UserRole::Entrenador)
            .await
            .unwrap();
        assert_eq!(changed.role, crate::models::UserRole::Entrenador);

        let update = crate::models::ProfileUpdate {
            phone: Some("+56922222222".to_string()),
            ..Default::default()
        };
        let user = auth::update_profile(&http, &update).await.unwrap();
        assert_eq!(user.phone.as_deref(), Some("+56922222222"));
        // The fresh snapshot lands in storage.
        assert!(http
            .storage()
            .get(crate::storage::USER_KEY)
            .unwrap()
            .contains("+56922222222"));
    }

    #[tokio::test]
    async fn test_password_reset_trio() {
        let router = Router::new()
            .route(
                "/api/auth/password/reset/",
                post(|| async { Json(serde_json::json!({ "ok": true })) }),
            )
            .route(
                "/api/auth/password/reset/validate/",
                post(|Json(body): Json<serde_json::Value>| async move {
                    assert_eq!(body["code"], "123456");
                    Json(serde_json::json!({ "ok": true }))
                }),
            )
            .route(
                "/api/auth/password/reset/confirm/",
                post(|Json(body): Json<serde_json::Value>| async move {
                    assert_eq!(body["new_password"], "nuevo-secreto");
                    Json(serde_json::json!({ "ok": true }))
                }),
            );
        let http = client(router).await;

        auth::request_password_reset(&http, "a@b.com").await.unwrap();
        auth::validate_reset_code(&http, "a@b.com", "123456").await.unwrap();
        auth::confirm_password_reset(&http, "a@b.com", "123456", "nuevo-secreto")
            .await
            .unwrap();
    }
}
