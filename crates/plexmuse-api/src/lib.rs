pub mod error;
pub mod handlers;

use axum::{
    routing::{get, post},
    Router,
};
use handlers::artists::{list_artists, ArtistResponse, __path_list_artists};
use handlers::recommendations::{
    create_recommendations, PlaylistResponse, RecommendationRequest,
    __path_create_recommendations,
};
use handlers::system::{
    health, refresh_cache, CacheStatusResponse, HealthResponse, __path_health,
    __path_refresh_cache,
};
use plexmuse_application::AppState;
use tower_http::cors::CorsLayer;
use tracing::info;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

pub use error::{ApiError, ErrorResponse};

#[derive(OpenApi)]
#[openapi(
    paths(
        health,
        refresh_cache,
        list_artists,
        create_recommendations,
    ),
    components(
        schemas(
            HealthResponse,
            CacheStatusResponse,
            ArtistResponse,
            RecommendationRequest,
            PlaylistResponse,
            ErrorResponse,
        )
    ),
    tags(
        (name = "system", description = "Health and cache maintenance"),
        (name = "artists", description = "Artists known to the media server"),
        (name = "playlists", description = "Prompt-driven playlist generation")
    ),
    info(
        title = "Plexmuse API",
        version = "0.1.0",
        description = "Generate playlists for a Plex music library from natural-language prompts",
    )
)]
struct ApiDoc;

pub fn router(state: AppState) -> Router {
    info!(target: "api", "building router");

    let openapi = ApiDoc::openapi();

    Router::new()
        .route("/health", get(health))
        .route("/artists", get(list_artists))
        .route("/recommendations", post(create_recommendations))
        .route("/cache/refresh", post(refresh_cache))
        .merge(SwaggerUi::new("/docs").url("/api-doc/openapi.json", openapi))
        .layer(CorsLayer::permissive())
        .with_state(state)
}
