pub mod catalog;
mod dto;
pub mod gateway;
pub mod handlers;
pub mod intake;
pub mod reconcile;
pub mod repo;

use crate::state::AppState;
use axum::Router;

pub fn router() -> Router<AppState> {
    handlers::router()
}
