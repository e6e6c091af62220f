//! Client for a property-listing storefront: public browsing with filters and
//! pagination, and an authenticated admin console over the same REST API.

pub mod admin;
pub mod api;
pub mod config;
pub mod error;
pub mod filters;
pub mod models;
pub mod session;
pub mod views;

pub use api::{ApiClient, FetchMode};
pub use config::Config;
pub use error::{ApiError, FieldErrors};
pub use session::{AuthState, Session};
