pub mod auth;
pub mod projects;

use axum::routing::{get, post};
use axum::Router;

use crate::state::SharedState;

pub fn api_routes() -> Router<SharedState> {
    Router::new()
        // Auth
        .route("/api/v1/auth/register", post(auth::register))
        .route("/api/v1/auth/login", post(auth::login))
        .route("/api/v1/auth/refresh", post(auth::refresh))
        .route("/api/v1/auth/logout", post(auth::logout))
        .route("/api/v1/auth/change-password", post(auth::change_password))
        .route(
            "/api/v1/auth/profile",
            get(auth::profile).put(auth::update_profile),
        )
        // Projects
        .route(
            "/api/v1/projects",
            get(projects::browse).post(projects::create),
        )
        .route("/api/v1/projects/{id}", get(projects::show))
        .route(
            "/api/v1/projects/{id}/participants",
            post(projects::add_participant),
        )
}
