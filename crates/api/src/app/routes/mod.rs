use axum::{routing::get, Router};

pub mod auth;
pub mod categories;
pub mod movements;
pub mod products;
pub mod suppliers;
pub mod system;
pub mod tasks;
pub mod users;

/// Router for all authenticated endpoints.
pub fn router() -> Router {
    Router::new()
        .route("/whoami", get(system::whoami))
        .nest("/products", products::router())
        .nest("/movements", movements::router())
        .nest("/categories", categories::router())
        .nest("/suppliers", suppliers::router())
        .nest("/users", users::router())
        .nest("/tasks", tasks::router())
}
