//! Application bootstrap: wires the configuration, storage, shell,
//! adapter, session, and checkout flow together, and drives the
//! per-navigation return handling the views hang off.

use anyhow::Result;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::api::store;
use crate::cart::Cart;
use crate::config::Config;
use crate::http::HttpClient;
use crate::payment::{CheckoutFlow, ReturnOutcome};
use crate::router::{self, resolve_view, Page, ReturnKind, ViewDescriptor};
use crate::session::Session;
use crate::shell::Shell;
use crate::storage::Storage;

/// Initialize the tracing subscriber. `RUST_LOG` wins over the
/// configured level. Call once from the host shell.
pub fn init_tracing(level: &str) {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level)),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// The assembled client core. Owns the session and checkout state; the
/// rendering shell reads [`App::current_view`] and calls back into the
/// operations.
pub struct App {
    config: Config,
    http: Arc<HttpClient>,
    pub session: Session,
    pub checkout: CheckoutFlow,
    cart: Cart,
    current_page: String,
}

impl App {
    /// Construct everything and silently restore the persisted session.
    /// The starting page comes from the `tab` query parameter when
    /// present.
    pub async fn boot(
        config: Config,
        storage: Arc<dyn Storage>,
        shell: Arc<dyn Shell>,
    ) -> Result<Self> {
        let http = Arc::new(HttpClient::new(&config.api, storage, shell)?);
        info!(base_url = %http.base_url(), "Client core starting");

        let mut session = Session::new(http.clone());
        session.restore().await;

        let checkout = CheckoutFlow::new(http.clone(), config.gateway.clone());
        let current_page = router::tab(&http.shell().current_url())
            .unwrap_or_else(|| Page::Home.as_str().to_string());

        Ok(Self {
            config,
            http,
            session,
            checkout,
            cart: Cart::empty(),
            current_page,
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn http(&self) -> &Arc<HttpClient> {
        &self.http
    }

    pub fn current_page(&self) -> &str {
        &self.current_page
    }

    pub fn navigate_to(&mut self, page: &str) {
        self.current_page = page.to_string();
    }

    pub fn cart(&self) -> &Cart {
        &self.cart
    }

    /// Handle a possible gateway return on the current navigation. The
    /// return shape is computed exactly once here and passed down;
    /// nothing else re-parses the URL. A confirmed store payment also
    /// refreshes the cart the store view displays.
    pub async fn process_return(&mut self) -> ReturnOutcome {
        let kind = ReturnKind::from_url(&self.http.shell().current_url());
        if kind == ReturnKind::Store {
            // Returning from the store gateway lands on the store view.
            self.current_page = Page::Tienda.as_str().to_string();
        }
        let outcome = self.checkout.handle_return(&mut self.session, kind).await;
        if kind == ReturnKind::Store && outcome == ReturnOutcome::Confirmed {
            self.refresh_cart().await;
        }
        outcome
    }

    /// Re-fetch the server-owned cart. Anonymous sessions always hold an
    /// empty cart; a fetch failure leaves it empty rather than stale.
    pub async fn refresh_cart(&mut self) {
        if !self.session.is_authenticated() {
            self.cart = Cart::empty();
            return;
        }
        self.cart = match store::cart(&self.http).await {
            Ok(payload) => Cart::from_payload(&payload),
            Err(_) => Cart::empty(),
        };
    }

    /// The view the shell should render right now.
    pub fn current_view(&self) -> ViewDescriptor {
        resolve_view(
            self.session.user(),
            self.session.is_blocked(),
            &self.current_page,
            &self.http.shell().current_url(),
        )
    }
}
