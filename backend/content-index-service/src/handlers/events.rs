use actix_web::{web, HttpResponse};
use content_index::{ContentSnapshot, InvalidationOutcome};
use serde::Deserialize;
use tracing::info;

use crate::error::{AppError, Result};
use crate::handlers::ContentIndexState;
use crate::metrics::CONTENT_INDEX_INVALIDATIONS_TOTAL;
use crate::middleware::{Principal, CAP_EDIT};

/// Content mutation reported by the host platform
#[derive(Debug, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum ContentEvent {
    ContentUpdated {
        before: ContentSnapshot,
        after: ContentSnapshot,
    },
    StatusTransition {
        old_status: String,
        new_status: String,
    },
}

impl ContentEvent {
    fn reason(&self) -> &'static str {
        match self {
            ContentEvent::ContentUpdated { .. } => "content_updated",
            ContentEvent::StatusTransition { .. } => "status_transition",
        }
    }
}

/// POST /api/v1/content-index/events
///
/// The caller is the acting principal; their index is rebuilt on invalidation.
pub async fn post_content_event(
    principal: Principal,
    state: web::Data<ContentIndexState>,
    event: web::Json<ContentEvent>,
) -> Result<HttpResponse> {
    principal.require(CAP_EDIT)?;

    let event = event.into_inner();
    let reason = event.reason();
    let trigger = state.index.trigger();

    let outcome = match &event {
        ContentEvent::ContentUpdated { before, after } => {
            if before.id != after.id {
                return Err(AppError::BadRequest(
                    "before and after must describe the same content item".to_string(),
                ));
            }
            trigger
                .on_content_updated(&principal.id, before, after)
                .await?
        }
        ContentEvent::StatusTransition {
            old_status,
            new_status,
        } => {
            trigger
                .on_content_status_transition(&principal.id, old_status, new_status)
                .await?
        }
    };

    let result = if outcome.is_invalidated() {
        "invalidated"
    } else {
        "ignored"
    };
    CONTENT_INDEX_INVALIDATIONS_TOTAL
        .with_label_values(&[reason, result])
        .inc();

    if let InvalidationOutcome::Invalidated { mark, rebuilt_at } = outcome {
        info!(principal = %principal.id, reason, mark, rebuilt_at, "Content index invalidated");
    }

    Ok(HttpResponse::Ok().json(outcome))
}
