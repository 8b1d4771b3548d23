/// HTTP handlers for the content index
///
/// - `index`: the per-principal index and the widget's client config
/// - `events`: content mutation hooks that drive invalidation
pub mod events;
pub mod index;

pub use events::{post_content_event, ContentEvent};
pub use index::{get_client_config, get_content_index, ClientConfig, ContentIndexState};

use actix_web::web;

use crate::middleware::{JwtAuthMiddleware, MetricsMiddleware};

/// Mount the authenticated content index routes under `/api/v1/content-index`
pub fn configure(cfg: &mut web::ServiceConfig, auth: JwtAuthMiddleware) {
    cfg.service(
        web::scope("/api/v1/content-index")
            .wrap(auth)
            .wrap(MetricsMiddleware)
            .route("", web::get().to(get_content_index))
            .route("/", web::get().to(get_content_index))
            .route("/config", web::get().to(get_client_config))
            .route("/events", web::post().to(post_content_event)),
    );
}
