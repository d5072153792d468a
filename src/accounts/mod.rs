use crate::state::AppState;
use axum::Router;

pub mod dto;
pub mod error;
pub mod handlers;
pub mod memory;
mod password;
pub mod repo;
pub mod repo_types;
pub mod services;

pub use error::{AccountError, StoreError};
pub use memory::InMemoryUserStore;
pub use repo::{PgUserStore, UserStore};
pub use repo_types::PublicUser;
pub use services::AccountService;

pub fn router() -> Router<AppState> {
    Router::new().merge(handlers::account_routes())
}
