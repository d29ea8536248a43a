//! API routes for the skydrop server.

pub mod locations;
pub mod missions;
pub mod planning;
mod routes;
pub mod weather;
pub mod ws;

use axum::Router;

pub fn routes() -> Router<std::sync::Arc<crate::state::AppState>> {
    routes::create_router()
}

#[cfg(test)]
mod tests;
