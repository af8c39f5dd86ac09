//! List pages: query building, execution and row projection.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use crate::error::{AdminResult, RequestError};
use crate::filter::{FilterEngine, FilterValue};
use crate::query::{Condition, Query, Record, RecordStore, SortDirection};
use crate::schema::FilterSpec;

use super::ResourceDefinition;

/// A requested sort on a table column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListSort {
    pub column: String,
    #[serde(default)]
    pub direction: SortDirection,
}

/// Parameters of a list page request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListRequest {
    /// 1-based page number.
    #[serde(default = "default_page")]
    pub page: u64,
    #[serde(default)]
    pub per_page: Option<u64>,
    /// Table search term.
    #[serde(default)]
    pub search: Option<String>,
    #[serde(default)]
    pub sort: Option<ListSort>,
    /// Active filter values by filter name.
    #[serde(default)]
    pub filters: BTreeMap<String, FilterValue>,
}

fn default_page() -> u64 {
    1
}

impl Default for ListRequest {
    fn default() -> Self {
        Self {
            page: default_page(),
            per_page: None,
            search: None,
            sort: None,
            filters: BTreeMap::new(),
        }
    }
}

impl ListRequest {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn page(mut self, page: u64) -> Self {
        self.page = page;
        self
    }

    pub fn per_page(mut self, per_page: u64) -> Self {
        self.per_page = Some(per_page);
        self
    }

    pub fn search(mut self, term: impl Into<String>) -> Self {
        self.search = Some(term.into());
        self
    }

    pub fn sort(mut self, column: impl Into<String>, direction: SortDirection) -> Self {
        self.sort = Some(ListSort {
            column: column.into(),
            direction,
        });
        self
    }

    pub fn filter(mut self, name: impl Into<String>, value: FilterValue) -> Self {
        self.filters.insert(name.into(), value);
        self
    }
}

/// One page of list results.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ListPage {
    pub records: Vec<Record>,
    /// Matching records across all pages.
    pub total: u64,
    pub page: u64,
    pub per_page: u64,
}

impl ListPage {
    /// Number of the last page, at least 1.
    pub fn last_page(&self) -> u64 {
        self.total.div_ceil(self.per_page.max(1)).max(1)
    }
}

/// One projected table cell.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TableCell {
    pub column: String,
    pub value: Value,
}

/// A record projected onto the table columns.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TableRow {
    pub id: String,
    pub cells: Vec<TableCell>,
}

impl TableRow {
    /// The value of a column, if the row has it.
    pub fn get(&self, column: &str) -> Option<&Value> {
        self.cells
            .iter()
            .find(|c| c.column == column)
            .map(|c| &c.value)
    }
}

impl ResourceDefinition {
    /// Resolves a filter named by a list request.
    pub fn request_filter(&self, name: &str) -> Result<&FilterSpec, RequestError> {
        self.filters()
            .iter()
            .find(|f| f.name() == name)
            .ok_or_else(|| RequestError::UnknownFilter {
                resource: self.name().to_string(),
                filter: name.to_string(),
            })
    }

    /// Builds the list query for a request. Performs no I/O.
    ///
    /// Associations read by table columns are eager-loaded. Filters apply in
    /// name order, then the table search, then the sort and pagination. The
    /// search matches searchable columns case-insensitively, following
    /// associations for dotted columns. A sort on an unknown or unsortable
    /// column is ignored.
    pub fn build_list_query(&self, request: &ListRequest) -> AdminResult<Query> {
        let mut query = Query::select(self.entity());

        for column in self.table_columns() {
            if let Some((association, _)) = column.relation_path() {
                query = query.with(self.association(association)?.clone());
            }
        }

        for (name, value) in &request.filters {
            let spec = self.request_filter(name)?;
            query = FilterEngine::apply(&query, spec, value)?;
        }

        if let Some(term) = request.search.as_deref().map(str::trim).filter(|t| !t.is_empty()) {
            let mut conditions = Vec::new();
            for column in self.table_columns().iter().filter(|c| c.searchable) {
                match column.relation_path() {
                    Some((association, field)) => conditions.push(Condition::related(
                        self.association(association)?.clone(),
                        Condition::contains(field, term),
                    )),
                    None => conditions.push(Condition::contains(&column.path, term)),
                }
            }
            if !conditions.is_empty() {
                query = query.filter_any(conditions);
            }
        }

        if let Some(sort) = &request.sort {
            match self.table_columns().iter().find(|c| c.path == sort.column) {
                Some(column) if column.sortable => {
                    query = match column.relation_path() {
                        Some((association, field)) => {
                            let association = self.association(association)?.clone();
                            query.order_by_related(&association, field, sort.direction)
                        }
                        None => query.order_by(&column.path, sort.direction),
                    };
                }
                _ => {
                    warn!(
                        resource = %self.name(),
                        column = %sort.column,
                        "Ignoring sort on unknown or unsortable column"
                    );
                }
            }
        }

        let per_page = self.effective_per_page(request);
        let page = request.page.max(1);

        debug!(
            resource = %self.name(),
            page,
            per_page,
            filters = request.filters.len(),
            "Built list query"
        );

        Ok(query
            .offset((page - 1).saturating_mul(per_page))
            .limit(per_page))
    }

    fn effective_per_page(&self, request: &ListRequest) -> u64 {
        request
            .per_page
            .unwrap_or(self.default_page_size)
            .clamp(1, self.max_page_size)
    }

    /// Runs a list request: one page of records plus the total count.
    pub async fn list(&self, store: &dyn RecordStore, request: &ListRequest) -> AdminResult<ListPage> {
        let query = self.build_list_query(request)?;
        let total = store.count(&query).await?;
        let records = store.execute(&query).await?;

        Ok(ListPage {
            records,
            total,
            page: request.page.max(1),
            per_page: self.effective_per_page(request),
        })
    }

    /// Projects records onto the table columns.
    ///
    /// Dotted columns read eager-loaded records: a single value for
    /// belongs-to associations, an array for belongs-to-many.
    pub fn table_rows(&self, records: &[Record]) -> Vec<TableRow> {
        records
            .iter()
            .map(|record| TableRow {
                id: record.id.clone(),
                cells: self
                    .table_columns()
                    .iter()
                    .map(|column| TableCell {
                        column: column.path.clone(),
                        value: self.column_value(record, &column.path),
                    })
                    .collect(),
            })
            .collect()
    }

    fn column_value(&self, record: &Record, path: &str) -> Value {
        let Some((association, field)) = path.split_once('.') else {
            return record.attribute(path);
        };

        let mut values = record.related_values(association, field);
        let many = self
            .association(association)
            .map(|a| a.is_many())
            .unwrap_or(false);

        if many {
            Value::Array(values)
        } else if values.is_empty() {
            Value::Null
        } else {
            values.swap_remove(0)
        }
    }
}
