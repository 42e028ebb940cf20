//! View routing and the access guard.
//!
//! The gateway-return shape of the current URL is computed once per
//! navigation into [`ReturnKind`] and consumed everywhere else; nothing
//! outside this module matches on the raw location string. The guard
//! itself, [`resolve_view`], is a pure function over the session state
//! and the requested page.

use crate::models::{User, UserRole};
use crate::shell::TOKEN_FIELD;

/// Return-path markers the payment gateway redirects back to. Bit-exact
/// protocol constants shared with the backend's return-URL builder.
pub const MATRICULA_RETURN_MARKER: &str = "webpay-retorno";
pub const STORE_RETURN_MARKER: &str = "tienda-webpay-retorno";
pub const ONLINE_RETURN_MARKER: &str = "pagos-online-retorno";

/// Which payment flow, if any, the current navigation is returning from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReturnKind {
    None,
    Matricula,
    Store,
    OnlinePayment,
}

impl ReturnKind {
    /// Classify a location string. The store marker contains the
    /// matriculation marker as a substring, so it is checked first; the
    /// markers may appear as a path segment or a bare query flag.
    pub fn from_url(url: &str) -> Self {
        if url.contains(STORE_RETURN_MARKER) {
            ReturnKind::Store
        } else if url.contains(ONLINE_RETURN_MARKER) {
            ReturnKind::OnlinePayment
        } else if url.contains(MATRICULA_RETURN_MARKER) {
            ReturnKind::Matricula
        } else {
            ReturnKind::None
        }
    }
}

/// Read a query parameter from a location string. Valueless flags
/// (`?webpay-retorno`) are skipped.
pub fn query_param(url: &str, key: &str) -> Option<String> {
    let query = url.split_once('?')?.1;
    query.split('&').find_map(|pair| {
        let (k, v) = pair.split_once('=')?;
        if k == key {
            Some(v.to_string())
        } else {
            None
        }
    })
}

/// Gateway token carried on every return path.
pub fn token_ws(url: &str) -> Option<String> {
    query_param(url, TOKEN_FIELD)
}

/// Starting view selected by the initial load.
pub fn tab(url: &str) -> Option<String> {
    query_param(url, "tab")
}

/// Drop one query parameter, keeping everything else (including
/// valueless flags) in order. Used to strip `token_ws` after a
/// confirmation attempt so a refresh cannot resubmit it.
pub fn strip_query_param(url: &str, key: &str) -> String {
    let Some((path, query)) = url.split_once('?') else {
        return url.to_string();
    };
    let remaining: Vec<&str> = query
        .split('&')
        .filter(|pair| {
            let name = pair.split('=').next().unwrap_or(pair);
            !(name == key && pair.contains('='))
        })
        .filter(|pair| !pair.is_empty())
        .collect();
    if remaining.is_empty() {
        path.to_string()
    } else {
        format!("{}?{}", path, remaining.join("&"))
    }
}

/// Page identifiers as they appear in the `tab` query parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Page {
    Home,
    Perfil,
    Tienda,
    MisAtletas,
    MisPagos,
    MisPedidos,
    Horarios,
    Notificaciones,
    Matricula,
    Admin,
}

impl Page {
    pub fn from_str(value: &str) -> Option<Self> {
        match value {
            "home" => Some(Page::Home),
            "perfil" => Some(Page::Perfil),
            "tienda" => Some(Page::Tienda),
            "mis-atletas" => Some(Page::MisAtletas),
            "mis-pagos" => Some(Page::MisPagos),
            "mis-pedidos" => Some(Page::MisPedidos),
            "horarios" => Some(Page::Horarios),
            "notificaciones" => Some(Page::Notificaciones),
            "matricula" => Some(Page::Matricula),
            "admin" => Some(Page::Admin),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Page::Home => "home",
            Page::Perfil => "perfil",
            Page::Tienda => "tienda",
            Page::MisAtletas => "mis-atletas",
            Page::MisPagos => "mis-pagos",
            Page::MisPedidos => "mis-pedidos",
            Page::Horarios => "horarios",
            Page::Notificaciones => "notificaciones",
            Page::Matricula => "matricula",
            Page::Admin => "admin",
        }
    }
}

impl std::fmt::Display for Page {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What the shell should render.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum View {
    Landing,
    Profile,
    /// Member store with the cart; apoderados and admins.
    MemberStore,
    /// Read-only store for other authenticated roles.
    PublicStore,
    MyAthletes,
    MyPayments,
    MyOrders,
    Schedule,
    Notifications,
    MatriculaForm,
    AdminPanel,
    /// Isolated full-screen waiting view while an online payment
    /// confirmation runs; no navigation chrome.
    OnlinePaymentReturn,
    /// Fixed placeholder shown instead of a page the session may not
    /// reach.
    AccessRestricted { message: &'static str },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewDescriptor {
    pub view: View,
    /// Whether navbar and footer render around the view.
    pub chrome: bool,
}

impl ViewDescriptor {
    fn with_chrome(view: View) -> Self {
        Self { view, chrome: true }
    }

    fn bare(view: View) -> Self {
        Self { view, chrome: false }
    }
}

const LOGIN_FOR_PROFILE: &str = "Por favor inicia sesión para ver tu perfil";
const LOGIN_FOR_STORE: &str = "Por favor inicia sesión para acceder a la tienda";
const LOGIN_FOR_ORDERS: &str = "Por favor inicia sesión para ver tus pedidos";
const LOGIN_FOR_NOTIFICATIONS: &str = "Por favor inicia sesión para ver tus notificaciones";
const LOGIN_FOR_MATRICULA: &str = "Por favor inicia sesión para matricular un atleta";
const APODERADOS_ONLY: &str = "Solo los apoderados pueden acceder a esta sección";
const ADMINS_ONLY: &str = "Solo los administradores pueden acceder a este panel";
const PUBLIC_ONLY: &str =
    "Esta opción está disponible para usuarios públicos. Si eres apoderado, matricula desde tus atletas.";

/// Map the session state and requested page to a permitted view.
///
/// Precedence: online-payment return (isolated screen) → blocked-account
/// override (dues page, chrome kept so the user can still log out) →
/// matriculation return (force the form so its confirmation can run) →
/// store return (force the store view) → the page table with its role
/// guards. Unknown page identifiers fall back to the landing view.
pub fn resolve_view(
    user: Option<&User>,
    is_blocked: bool,
    requested_page: &str,
    url: &str,
) -> ViewDescriptor {
    let return_kind = ReturnKind::from_url(url);

    if return_kind == ReturnKind::OnlinePayment {
        return ViewDescriptor::bare(View::OnlinePaymentReturn);
    }

    if is_blocked {
        return ViewDescriptor::with_chrome(View::MyPayments);
    }

    if return_kind == ReturnKind::Matricula {
        return ViewDescriptor::with_chrome(View::MatriculaForm);
    }

    let page = if return_kind == ReturnKind::Store {
        Some(Page::Tienda)
    } else {
        Page::from_str(requested_page)
    };

    let role = user.map(|u| u.role);
    let view = match page {
        Some(Page::Home) | None => View::Landing,
        Some(Page::Perfil) => match role {
            Some(_) => View::Profile,
            None => View::AccessRestricted {
                message: LOGIN_FOR_PROFILE,
            },
        },
        Some(Page::Tienda) => match role {
            Some(UserRole::Apoderado) | Some(UserRole::Admin) => View::MemberStore,
            Some(_) => View::PublicStore,
            None => View::AccessRestricted {
                message: LOGIN_FOR_STORE,
            },
        },
        Some(Page::MisAtletas) => apoderado_or_admin(role, View::MyAthletes),
        Some(Page::MisPagos) => apoderado_or_admin(role, View::MyPayments),
        Some(Page::Horarios) => apoderado_or_admin(role, View::Schedule),
        Some(Page::MisPedidos) => match role {
            Some(_) => View::MyOrders,
            None => View::AccessRestricted {
                message: LOGIN_FOR_ORDERS,
            },
        },
        Some(Page::Notificaciones) => match role {
            Some(_) => View::Notifications,
            None => View::AccessRestricted {
                message: LOGIN_FOR_NOTIFICATIONS,
            },
        },
        Some(Page::Matricula) => match role {
            // Existing apoderados matriculate through their athletes view.
            Some(UserRole::Public) => View::MatriculaForm,
            Some(_) => View::AccessRestricted {
                message: PUBLIC_ONLY,
            },
            None => View::AccessRestricted {
                message: LOGIN_FOR_MATRICULA,
            },
        },
        Some(Page::Admin) => match role {
            Some(UserRole::Admin) => View::AdminPanel,
            _ => View::AccessRestricted {
                message: ADMINS_ONLY,
            },
        },
    };
    ViewDescriptor::with_chrome(view)
}

fn apoderado_or_admin(role: Option<UserRole>, view: View) -> View {
    match role {
        Some(UserRole::Apoderado) | Some(UserRole::Admin) => view,
        _ => View::AccessRestricted {
            message: APODERADOS_ONLY,
        },
    }
}
