use actix_web::{web, HttpResponse};
use content_index::{CacheOutcome, ContentIndex, Shortcut, Timestamp};
use serde::Serialize;
use std::collections::BTreeMap;
use std::time::Instant;
use tracing::{debug, warn};

use crate::error::Result;
use crate::metrics::{CONTENT_INDEX_REBUILD_DURATION_SECONDS, CONTENT_INDEX_REQUESTS_TOTAL};
use crate::middleware::{Principal, CAP_READ};

pub struct ContentIndexState {
    pub index: ContentIndex,
    /// Base URL handed to the navigation widget
    pub api_url: String,
}

/// Configuration consumed by the client-side navigation widget
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientConfig {
    pub results_limit: usize,
    pub shortcuts: BTreeMap<String, Shortcut>,
    /// Cache-busting version; the principal's current build time
    pub version: Timestamp,
    pub api_url: String,
}

/// GET /api/v1/content-index/
///
/// Items the principal may not view are omitted, never reported as errors.
pub async fn get_content_index(
    principal: Principal,
    state: web::Data<ContentIndexState>,
) -> Result<HttpResponse> {
    principal.require(CAP_READ)?;

    let started = Instant::now();
    let lookup = match state.index.controller().lookup(&principal.id).await {
        Ok(lookup) => lookup,
        Err(e) => {
            warn!(principal = %principal.id, error = %e, "Content index lookup failed");
            CONTENT_INDEX_REQUESTS_TOTAL
                .with_label_values(&["error"])
                .inc();
            return Err(e.into());
        }
    };

    CONTENT_INDEX_REQUESTS_TOTAL
        .with_label_values(&[lookup.outcome.as_str()])
        .inc();
    if lookup.outcome == CacheOutcome::Miss {
        CONTENT_INDEX_REBUILD_DURATION_SECONDS.observe(started.elapsed().as_secs_f64());
    }

    debug!(
        principal = %principal.id,
        outcome = lookup.outcome.as_str(),
        items = lookup.items.len(),
        "Serving content index"
    );

    Ok(HttpResponse::Ok().json(lookup.items))
}

/// GET /api/v1/content-index/config
pub async fn get_client_config(
    principal: Principal,
    state: web::Data<ContentIndexState>,
) -> Result<HttpResponse> {
    principal.require(CAP_READ)?;

    let version = state
        .index
        .controller()
        .build_timestamp(&principal.id)
        .await?;
    let config = state.index.config();

    Ok(HttpResponse::Ok().json(ClientConfig {
        results_limit: config.results_limit,
        shortcuts: config.shortcuts.clone(),
        version,
        api_url: state.api_url.clone(),
    }))
}
