//! Global search across every searchable resource of a registry.
//!
//! Each resource contributes its own query through
//! [`ResourceDefinition::build_search_query`]. Resources are visited in
//! registration order and every resource returns at most `limit` hits, in the
//! store's insertion order.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::AdminConfig;
use crate::error::AdminResult;
use crate::query::value::{contains, stringify};
use crate::query::{Record, RecordStore};
use crate::resource::{ResourceDefinition, ResourceRegistry};

/// One global search hit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchResult {
    /// Name of the resource the record belongs to.
    pub resource_name: String,
    pub record_id: String,
    /// The record's title attribute.
    pub title: String,
    /// Edit page of the record, including the panel prefix.
    pub url: String,
    /// `(label, value)` lines read from the record or its eager-loaded associations.
    pub details: Vec<(String, String)>,
    /// Searchable attributes whose value contains the term.
    pub matched_attributes: Vec<String>,
}

/// Runs global search over a registry.
#[derive(Debug, Clone)]
pub struct GlobalSearch {
    registry: Arc<ResourceRegistry>,
    config: AdminConfig,
}

impl GlobalSearch {
    pub fn new(registry: Arc<ResourceRegistry>, config: AdminConfig) -> Self {
        Self { registry, config }
    }

    /// Searches with the configured per-resource limit.
    pub async fn search_default(
        &self,
        store: &dyn RecordStore,
        term: &str,
    ) -> AdminResult<Vec<SearchResult>> {
        self.search(store, term, self.config.global_search_limit)
            .await
    }

    /// Searches every globally searchable resource for `term`.
    ///
    /// A blank term, or a zero limit, returns nothing without querying the
    /// store. A store failure fails the whole search.
    pub async fn search(
        &self,
        store: &dyn RecordStore,
        term: &str,
        limit: usize,
    ) -> AdminResult<Vec<SearchResult>> {
        let term = term.trim();
        if term.is_empty() || limit == 0 {
            return Ok(Vec::new());
        }

        let mut results = Vec::new();
        for resource in self.registry.iter() {
            if !resource.is_globally_searchable() {
                continue;
            }

            let query = resource.build_search_query(term, limit);
            let records = store.execute(&query).await?;

            debug!(
                resource = %resource.name(),
                term = %term,
                hits = records.len(),
                "Global search fan-out"
            );

            results.extend(
                records
                    .iter()
                    .take(limit)
                    .map(|record| self.to_result(resource, record, term)),
            );
        }

        Ok(results)
    }

    fn to_result(&self, resource: &ResourceDefinition, record: &Record, term: &str) -> SearchResult {
        let title = resource
            .title_attribute()
            .map(|attribute| record.attribute_text(attribute))
            .unwrap_or_else(|| record.id.clone());

        let details = resource
            .search_details()
            .iter()
            .map(|detail| (detail.label.clone(), detail_value(record, &detail.path)))
            .collect();

        let matched_attributes = resource
            .searchable_attributes()
            .iter()
            .filter(|attribute| contains(&record.attribute(attribute), term))
            .cloned()
            .collect();

        SearchResult {
            resource_name: resource.name().to_string(),
            record_id: record.id.clone(),
            title,
            url: format!(
                "{}{}",
                self.config.panel_path.trim_end_matches('/'),
                resource.edit_url(&record.id)
            ),
            details,
            matched_attributes,
        }
    }
}

/// Reads a detail path. Values of a to-many association are joined with ", ".
fn detail_value(record: &Record, path: &str) -> String {
    match path.split_once('.') {
        Some((association, field)) => record
            .related_values(association, field)
            .iter()
            .filter_map(stringify)
            .collect::<Vec<_>>()
            .join(", "),
        None => record.attribute_text(path),
    }
}
