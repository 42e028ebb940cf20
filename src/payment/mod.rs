//! Payment redirect flow (Webpay-style token exchange).
//!
//! One [`CheckoutFlow`] instance models one checkout attempt:
//! `Idle → ChargeCreated → Redirecting → (browser leaves) →
//! Confirming → Confirmed | Failed`. The redirect itself is a top-level
//! form POST the state machine cannot observe; it only resumes from the
//! return URL. Confirmation is safe against refreshes because the token
//! is stripped from the URL immediately after the attempt; the server
//! stays the authority on duplicate confirmations, and the client never
//! retries one on its own.

use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

use crate::api::{auth, payments, store};
use crate::config::GatewayConfig;
use crate::http::{ApiError, HttpClient};
use crate::models::{MatriculaRequest, Obligation, Order, WebpayInit};
use crate::router::{strip_query_param, token_ws, ReturnKind};
use crate::session::Session;
use crate::shell::{GatewayForm, Shell, TOKEN_FIELD};

/// Delay before leaving the matriculation confirmation screen, long
/// enough for the success notice to render.
pub const MATRICULA_REDIRECT_DELAY_MS: u64 = 50;
/// Delay before leaving the online-payment waiting screen.
pub const ONLINE_REDIRECT_DELAY_MS: u64 = 1200;

/// Shown on the isolated waiting screen when the gateway redirected back
/// without a token.
pub const MISSING_TOKEN_MESSAGE: &str = "No se encontró el token de pago.";

/// What a checkout attempt is paying for. Determines the init/confirm
/// endpoint pair and the buy-order prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaymentSubject {
    Matricula { matricula_id: i64 },
    StoreOrder { order_id: i64 },
    RecurringObligation { obligacion_id: i64 },
}

/// Ephemeral record of the charge being paid. Created when checkout
/// starts, destroyed on confirmation or terminal failure; abandoning the
/// page simply drops it and the server keeps the charge's real status.
#[derive(Debug, Clone)]
pub struct PendingPayment {
    pub subject: PaymentSubject,
    pub amount: i64,
    /// Client-generated order id; the store flow leaves this to the
    /// server.
    pub buy_order: Option<String>,
    pub session_id: Option<String>,
    pub gateway_token: Option<String>,
    pub gateway_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckoutState {
    Idle,
    ChargeCreated,
    Redirecting,
    Confirming,
    Confirmed,
    Failed { message: String },
}

/// Outcome of processing a gateway return URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReturnOutcome {
    /// The navigation was not a gateway return, or carried no token.
    NotAReturn,
    Confirmed,
    Failed { message: String },
}

pub struct CheckoutFlow {
    http: Arc<HttpClient>,
    gateway: GatewayConfig,
    state: CheckoutState,
    pending: Option<PendingPayment>,
}

impl CheckoutFlow {
    pub fn new(http: Arc<HttpClient>, gateway: GatewayConfig) -> Self {
        Self {
            http,
            gateway,
            state: CheckoutState::Idle,
            pending: None,
        }
    }

    pub fn state(&self) -> &CheckoutState {
        &self.state
    }

    pub fn pending(&self) -> Option<&PendingPayment> {
        self.pending.as_ref()
    }

    /// Abandon the current attempt. No retry state survives client-side.
    pub fn reset(&mut self) {
        self.state = CheckoutState::Idle;
        self.pending = None;
    }

    /// Register a matriculation and hand the browser to the gateway.
    pub async fn start_matricula(
        &mut self,
        session: &Session,
        request: &MatriculaRequest,
    ) -> Result<(), ApiError> {
        let created = payments::register_matricula(&self.http, request)
            .await
            .map_err(|e| self.fail(e))?;

        let millis = now_millis();
        let buy_order = matricula_buy_order(created.id, millis);
        let session_id = gateway_session_id(session.user().map(|u| u.id.as_str()), millis);
        self.pending = Some(PendingPayment {
            subject: PaymentSubject::Matricula {
                matricula_id: created.id,
            },
            amount: request.monto,
            buy_order: Some(buy_order.clone()),
            session_id: Some(session_id.clone()),
            gateway_token: None,
            gateway_url: None,
        });
        self.state = CheckoutState::ChargeCreated;

        let init = payments::init_webpay(&self.http, created.id, request.monto, &buy_order, &session_id)
            .await
            .map_err(|e| self.fail(e))?;
        self.redirect(init);
        Ok(())
    }

    /// Pay an existing store order. The server generated its buy-order
    /// when the order was created.
    pub async fn start_store_order(&mut self, order: &Order) -> Result<(), ApiError> {
        self.pending = Some(PendingPayment {
            subject: PaymentSubject::StoreOrder { order_id: order.id },
            amount: order.total.unwrap_or(0),
            buy_order: None,
            session_id: None,
            gateway_token: None,
            gateway_url: None,
        });
        self.state = CheckoutState::ChargeCreated;

        let init = store::init_order_webpay(&self.http, order.id)
            .await
            .map_err(|e| self.fail(e))?;
        self.redirect(init);
        Ok(())
    }

    /// Pay one recurring obligation through the redirect cycle.
    pub async fn start_obligation(
        &mut self,
        session: &Session,
        obligation: &Obligation,
    ) -> Result<(), ApiError> {
        let millis = now_millis();
        let buy_order = obligation_buy_order(obligation.id, millis);
        let session_id = gateway_session_id(session.user().map(|u| u.id.as_str()), millis);
        self.pending = Some(PendingPayment {
            subject: PaymentSubject::RecurringObligation {
                obligacion_id: obligation.id,
            },
            amount: obligation.monto.unwrap_or(0),
            buy_order: Some(buy_order.clone()),
            session_id: Some(session_id.clone()),
            gateway_token: None,
            gateway_url: None,
        });
        self.state = CheckoutState::ChargeCreated;

        let init = payments::init_webpay_online(&self.http, obligation.id, &buy_order, &session_id)
            .await
            .map_err(|e| self.fail(e))?;
        self.redirect(init);
        Ok(())
    }

    /// Process a gateway return navigation: confirm the token against the
    /// flow-specific endpoint, strip it from the URL so a refresh cannot
    /// resubmit it, resynchronize the session, and leave the return
    /// screen. `kind` is the [`ReturnKind`] computed once for this
    /// navigation.
    pub async fn handle_return(&mut self, session: &mut Session, kind: ReturnKind) -> ReturnOutcome {
        if kind == ReturnKind::None {
            return ReturnOutcome::NotAReturn;
        }

        let url = self.http.shell().current_url();
        let Some(token) = token_ws(&url) else {
            // Only the isolated waiting screen reports the missing token;
            // on the other return paths a token-less render is a normal
            // second pass after stripping.
            if kind == ReturnKind::OnlinePayment {
                self.state = CheckoutState::Failed {
                    message: MISSING_TOKEN_MESSAGE.to_string(),
                };
                return ReturnOutcome::Failed {
                    message: MISSING_TOKEN_MESSAGE.to_string(),
                };
            }
            return ReturnOutcome::NotAReturn;
        };

        self.state = CheckoutState::Confirming;
        let result = match kind {
            ReturnKind::Matricula => payments::confirm_webpay(&self.http, &token).await,
            ReturnKind::Store => store::confirm_order_webpay(&self.http, &token).await,
            ReturnKind::OnlinePayment => payments::confirm_webpay_online(&self.http, &token).await,
            ReturnKind::None => unreachable!(),
        };

        // Strip the token no matter how the confirmation went; a page
        // refresh must find nothing left to resubmit.
        self.http
            .shell()
            .replace_url(&strip_query_param(&url, TOKEN_FIELD));

        match result {
            Ok(confirmation) => {
                if let Some(user) = &confirmation.user {
                    auth::persist_user(&self.http, user);
                }
                if matches!(kind, ReturnKind::Matricula | ReturnKind::OnlinePayment) {
                    // Resynchronize role and block state; a confirmed
                    // payment may have promoted the account or settled
                    // the blocking debt.
                    session.refresh_user().await;
                }
                self.state = CheckoutState::Confirmed;
                self.pending = None;
                info!(?kind, "Payment confirmed");

                match kind {
                    ReturnKind::Matricula => {
                        tokio::time::sleep(Duration::from_millis(MATRICULA_REDIRECT_DELAY_MS)).await;
                        self.http.shell().navigate(&self.gateway.landing_route);
                    }
                    ReturnKind::OnlinePayment => {
                        tokio::time::sleep(Duration::from_millis(ONLINE_REDIRECT_DELAY_MS)).await;
                        self.http.shell().navigate(&self.gateway.dues_route);
                    }
                    // The store view stays up; the caller refreshes the
                    // cart it owns.
                    ReturnKind::Store | ReturnKind::None => {}
                }
                ReturnOutcome::Confirmed
            }
            Err(err) => {
                warn!(?kind, status = err.status, "Payment confirmation failed");
                self.state = CheckoutState::Failed {
                    message: err.message.clone(),
                };
                // No automatic retry; the user stays on the waiting
                // screen and must re-initiate checkout from scratch.
                ReturnOutcome::Failed {
                    message: err.message,
                }
            }
        }
    }

    fn redirect(&mut self, init: WebpayInit) {
        if let Some(pending) = self.pending.as_mut() {
            pending.gateway_token = Some(init.token.clone());
            pending.gateway_url = Some(init.url.clone());
        }
        self.state = CheckoutState::Redirecting;
        info!(url = %init.url, "Handing control to the payment gateway");
        self.http
            .shell()
            .submit_gateway_form(&GatewayForm::new(init.url, init.token));
    }

    fn fail(&mut self, err: ApiError) -> ApiError {
        warn!(status = err.status, message = %err.message, "Checkout step failed");
        self.state = CheckoutState::Failed {
            message: err.message.clone(),
        };
        self.pending = None;
        err
    }
}

/// Batch-charge every eligible obligation against the stored default
/// card. No redirect cycle; returns the number of obligations paid.
pub async fn run_autopay(http: &HttpClient) -> Result<u32, ApiError> {
    let outcome = payments::autopay(http).await?;
    info!(paid = outcome.pagadas, "Autopay batch finished");
    Ok(outcome.pagadas)
}

/// `orden-<matriculaId>-<millis>`; unique per attempt even when the same
/// matriculation is retried.
pub fn matricula_buy_order(matricula_id: i64, millis: i64) -> String {
    format!("orden-{}-{}", matricula_id, millis)
}

/// `po-<obligacionId>-<millis>`.
pub fn obligation_buy_order(obligacion_id: i64, millis: i64) -> String {
    format!("po-{}-{}", obligacion_id, millis)
}

/// `sess-<userId|anon>-<millis>`.
pub fn gateway_session_id(user_id: Option<&str>, millis: i64) -> String {
    format!("sess-{}-{}", user_id.unwrap_or("anon"), millis)
}

fn now_millis() -> i64 {
    Utc::now().timestamp_millis()
}
