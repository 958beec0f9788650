use axum::extract::DefaultBodyLimit;
use axum::routing::{delete, get, post, put};
use axum::{middleware, Router};
use tower_http::cors::CorsLayer;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;

use crate::handlers::{admin, authors, favorites, history, materials, system, tags};
use crate::middleware::track_errors;
use crate::state::AppState;

pub const PREFIX: &str = "/repositorio";

/// Full application router. `max_body_bytes` caps uploads.
pub fn router(state: AppState, max_body_bytes: usize) -> Router {
    let api = Router::new()
        .route("/materiales", get(materials::list).post(materials::upload))
        .route("/materiales/buscar", get(materials::search))
        .route("/materiales/autor/{author_id}", get(materials::by_author))
        .route("/materiales/tag/{tag_id}", get(materials::by_tag))
        .route(
            "/materiales/{id}",
            get(materials::get)
                .put(materials::update)
                .delete(materials::delete),
        )
        .route("/materiales/{id}/archivo", get(materials::file))
        .route("/materiales/{id}/favoritos", get(materials::favorite_count))
        .route("/admin/materiales", get(admin::list))
        .route(
            "/admin/materiales/{id}/disponibilidad",
            put(admin::set_availability),
        )
        .route("/admin/materiales/{id}/status", put(admin::set_status))
        .route("/historial", post(history::record))
        .route(
            "/historial/{user_id}",
            get(history::list).delete(history::clear),
        )
        .route(
            "/historial/{user_id}/materiales/{material_id}",
            delete(history::remove),
        )
        .route("/favoritos", post(favorites::add))
        .route("/favoritos/{user_id}", get(favorites::list))
        .route(
            "/favoritos/{user_id}/{material_id}",
            get(favorites::check).delete(favorites::remove),
        )
        .route("/autores", get(authors::list).post(authors::create))
        .route("/autores/obtener-o-crear", post(authors::find_or_create))
        .route("/autores/relacion", post(authors::link_user))
        .route("/autores/relacion/{user_id}", get(authors::author_of_user))
        .route(
            "/autores/relacion/{user_id}/{author_id}",
            delete(authors::unlink_user),
        )
        .route(
            "/autores/{id}",
            get(authors::get).put(authors::update).delete(authors::delete),
        )
        .route("/tags", get(tags::list).post(tags::create))
        .route(
            "/tags/{id}",
            get(tags::get).put(tags::rename).delete(tags::delete),
        )
        .route("/health", get(system::health))
        .route("/metrics", get(system::metrics));

    Router::new()
        .nest(PREFIX, api)
        .layer(middleware::from_fn_with_state(state.clone(), track_errors))
        .layer(DefaultBodyLimit::max(max_body_bytes))
        .layer(RequestBodyLimitLayer::new(max_body_bytes))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
