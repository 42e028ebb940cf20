//! Browser-effect seam.
//!
//! Everything that touches the page itself (the current URL, history
//! replacement, top-level navigation, and the gateway form POST) goes
//! through the [`Shell`] trait. The core never reaches for the DOM
//! directly, which keeps the checkout and routing logic testable.

use parking_lot::RwLock;

/// The hidden-field name the payment gateway reads the token from.
/// Bit-exact protocol constant; shared with the return-URL parser.
pub const TOKEN_FIELD: &str = "token_ws";

/// A top-level form POST handing control to the external payment gateway.
///
/// This is a full browser navigation, not an XHR: once submitted, the
/// application is gone until the gateway redirects back. The checkout
/// state machine treats submission as a terminal, unobservable action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GatewayForm {
    /// Gateway URL the form targets.
    pub action: String,
    /// Opaque transaction token placed in the `token_ws` hidden field.
    pub token: String,
}

impl GatewayForm {
    pub fn new(action: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            action: action.into(),
            token: token.into(),
        }
    }

    /// Render the exact form markup a browser shell appends to the
    /// document body and submits.
    pub fn to_html(&self) -> String {
        format!(
            "<form method=\"POST\" action=\"{}\"><input type=\"hidden\" name=\"{}\" value=\"{}\"/></form>",
            escape_attr(&self.action),
            TOKEN_FIELD,
            escape_attr(&self.token),
        )
    }
}

fn escape_attr(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

/// Host-environment operations the core needs from the page.
pub trait Shell: Send + Sync {
    /// Current location, path plus query string (e.g. `/?tab=tienda`).
    fn current_url(&self) -> String;
    /// Replace the current history entry without reloading.
    fn replace_url(&self, url: &str);
    /// Full top-level navigation.
    fn navigate(&self, url: &str);
    /// Build and submit the gateway form; control leaves the app.
    fn submit_gateway_form(&self, form: &GatewayForm);
}

/// Shell backend for tests and headless hosts: tracks the URL in memory
/// and records every submitted form and navigation.
#[derive(Default)]
pub struct HeadlessShell {
    url: RwLock<String>,
    submitted: RwLock<Vec<GatewayForm>>,
    navigations: RwLock<Vec<String>>,
}

impl HeadlessShell {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: RwLock::new(url.into()),
            submitted: RwLock::new(Vec::new()),
            navigations: RwLock::new(Vec::new()),
        }
    }

    pub fn submitted_forms(&self) -> Vec<GatewayForm> {
        self.submitted.read().clone()
    }

    pub fn navigations(&self) -> Vec<String> {
        self.navigations.read().clone()
    }
}

impl Shell for HeadlessShell {
    fn current_url(&self) -> String {
        self.url.read().clone()
    }

    fn replace_url(&self, url: &str) {
        *self.url.write() = url.to_string();
    }

    fn navigate(&self, url: &str) {
        self.navigations.write().push(url.to_string());
        *self.url.write() = url.to_string();
    }

    fn submit_gateway_form(&self, form: &GatewayForm) {
        self.submitted.write().push(form.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gateway_form_html_carries_token_field() {
        let form = GatewayForm::new("https://gw/test", "xyz");
        let html = form.to_html();
        assert!(html.contains("method=\"POST\""));
        assert!(html.contains("action=\"https://gw/test\""));
        assert!(html.contains("name=\"token_ws\""));
        assert!(html.contains("value=\"xyz\""));
    }

    #[test]
    fn test_gateway_form_escapes_attributes() {
        let form = GatewayForm::new("https://gw/init?a=1&b=2", "tok\"en");
        let html = form.to_html();
        assert!(html.contains("a=1&amp;b=2"));
        assert!(html.contains("tok&quot;en"));
    }

    #[test]
    fn test_headless_shell_records_effects() {
        let shell = HeadlessShell::new("/?tab=tienda");
        assert_eq!(shell.current_url(), "/?tab=tienda");

        shell.replace_url("/");
        assert_eq!(shell.current_url(), "/");
        assert!(shell.navigations().is_empty());

        shell.navigate("/?tab=mis-pagos");
        assert_eq!(shell.navigations(), vec!["/?tab=mis-pagos".to_string()]);

        shell.submit_gateway_form(&GatewayForm::new("https://gw", "t"));
        assert_eq!(shell.submitted_forms().len(), 1);
    }
}
