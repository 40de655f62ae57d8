use axum::Router;

pub mod common;
pub mod documents;
pub mod sequences;
pub mod serials;
pub mod suppliers;
pub mod system;

/// Router for all resource endpoints.
pub fn router() -> Router {
    Router::new()
        .nest("/serials", serials::router())
        .nest("/documents", documents::router())
        .nest("/sequences", sequences::router())
        .nest("/suppliers", suppliers::router())
}
