pub mod auth;
pub mod authz;
pub mod campgrounds;
pub mod error;
pub mod flash;
pub mod forms;
pub mod geocoding;
pub mod images;
pub mod middleware;
pub mod pages;
pub mod reviews;
pub mod routes;
pub mod session;
pub mod state;
pub mod store;
pub mod validation;

pub use routes::{router, with_method_override};
pub use state::{AppState, AppStateInner};
