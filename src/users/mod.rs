mod dto;
pub mod handlers;
pub mod model;
pub mod service;

use axum::{
    routing::{get, post, put},
    Router,
};

use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/user/register", post(handlers::register))
        .route("/user/login", post(handlers::login))
        .route("/user/refresh", post(handlers::refresh))
        .route("/user/current", get(handlers::current_user))
        .route("/userlist", get(handlers::list_users))
        .route(
            "/users/:id",
            get(handlers::get_user)
                .put(handlers::update_profile)
                .delete(handlers::delete_user),
        )
        .route("/users/:id/password", put(handlers::update_password))
        .route("/users/:id/likes", put(handlers::update_following))
        .route(
            "/users/:id/activate/:activation_key",
            get(handlers::activate),
        )
}
