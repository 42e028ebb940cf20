pub mod api;
pub mod cart;
pub mod config;
pub mod http;
pub mod models;
pub mod payment;
pub mod router;
pub mod session;
pub mod shell;
pub mod startup;
pub mod storage;

pub use config::Config;
pub use http::{ApiError, ErrorKind, HttpClient};
pub use payment::{CheckoutFlow, CheckoutState, ReturnOutcome};
pub use router::{resolve_view, Page, ReturnKind, View, ViewDescriptor};
pub use session::{LoginOutcome, Session};
pub use shell::{GatewayForm, Shell};
pub use startup::App;
pub use storage::Storage;
