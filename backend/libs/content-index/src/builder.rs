//! Index builder
//!
//! Projects the newest `results_limit` raw items into records, dropping the
//! ones the principal may not view. Items past the limit are never considered,
//! even when filtering leaves room for them.

use std::sync::Arc;
use tracing::debug;

use crate::helpers::{escape_html, render_edit_url};
use crate::source::{ContentSource, ListParams, RawContentItem};
use crate::{ContentRecord, IndexConfig, PrincipalId, Result};

pub struct IndexBuilder {
    source: Arc<dyn ContentSource>,
    config: Arc<IndexConfig>,
}

impl IndexBuilder {
    pub fn new(source: Arc<dyn ContentSource>, config: Arc<IndexConfig>) -> Self {
        Self { source, config }
    }

    /// Build a fresh record list for `principal`
    ///
    /// Source order is preserved. Any source failure aborts the whole build.
    pub async fn build(&self, principal: &PrincipalId) -> Result<Vec<ContentRecord>> {
        let params = ListParams {
            limit: self.config.results_limit,
        };
        let mut raw_items = self.source.list_content(&params).await?;
        raw_items.truncate(params.limit);
        let considered = raw_items.len();

        let records: Vec<ContentRecord> = self
            .source
            .filter_viewable(principal, raw_items)
            .await?
            .iter()
            .map(|item| self.project(item))
            .collect();

        debug!(
            principal = %principal,
            considered,
            visible = records.len(),
            "Index built"
        );

        Ok(records)
    }

    fn project(&self, item: &RawContentItem) -> ContentRecord {
        ContentRecord {
            title: escape_html(&item.title),
            content_type: item.content_type.clone(),
            url: render_edit_url(
                &self.config.edit_url_template,
                &item.id.to_string(),
                &item.content_type,
            ),
        }
    }
}
