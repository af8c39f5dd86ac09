//! Resource definitions.
//!
//! A [`ResourceDefinition`] binds an entity to its form schema, list table,
//! filters, global search capability and page routes. Definitions are built
//! once with [`ResourceDefinition::builder`], which rejects every structural
//! misconfiguration with a [`SchemaError`], and are immutable afterwards.
//!
//! # Example
//!
//! ```
//! use shopdesk_engine::query::Association;
//! use shopdesk_engine::resource::ResourceDefinition;
//! use shopdesk_engine::schema::{FieldDescriptor, TableColumn};
//!
//! let brands = ResourceDefinition::builder("brands", "brands")
//!     .labels("Brand", "Brands")
//!     .field(FieldDescriptor::text("name").required().unique())
//!     .field(FieldDescriptor::text("slug").slug_of("name").disabled())
//!     .column(TableColumn::text("name").searchable().sortable())
//!     .globally_searchable("name", ["name", "slug"])
//!     .build()
//!     .unwrap();
//!
//! assert_eq!(brands.edit_url("42"), "/brands/42/edit");
//! assert!(brands.is_globally_searchable());
//! ```

mod form;
mod list;
mod registry;
mod validation;

pub use form::{FormOperation, RelationOption, ValidatedRecord};
pub use list::{ListPage, ListRequest, ListSort, TableCell, TableRow};
pub use registry::{ResourceRegistry, ResourceRegistryBuilder};

use std::collections::HashMap;

use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::AdminConfig;
use crate::error::SchemaError;
use crate::query::{Association, Condition, Query};
use crate::schema::{FieldDescriptor, FieldKind, FilterSpec, ResourceSchema, TableColumn, humanize};

/// Sidebar entry of a resource.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Navigation {
    pub label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group: Option<String>,
    #[serde(default)]
    pub sort: i32,
}

/// A named route of a resource, relative to the resource root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRoute {
    pub name: String,
    /// Path template. `{record}` stands for the record id.
    pub path: String,
}

impl PageRoute {
    pub fn new(name: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
        }
    }
}

/// An extra line shown under a global search hit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchDetail {
    pub label: String,
    /// An attribute or an `association.field` path.
    pub path: String,
}

/// The complete, validated definition of one resource.
#[derive(Debug, Clone)]
pub struct ResourceDefinition {
    name: String,
    entity: String,
    model_label: String,
    plural_label: String,
    navigation: Navigation,
    schema: ResourceSchema,
    associations: Vec<Association>,
    title_attribute: Option<String>,
    search_includes: Vec<String>,
    search_details: Vec<SearchDetail>,
    pages: Vec<PageRoute>,
    default_page_size: u64,
    max_page_size: u64,
    patterns: HashMap<String, Regex>,
}

impl ResourceDefinition {
    /// Starts a definition. `name` is the route segment, `entity` the store entity.
    pub fn builder(name: impl Into<String>, entity: impl Into<String>) -> ResourceDefinitionBuilder {
        ResourceDefinitionBuilder::new(name.into(), entity.into())
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn entity(&self) -> &str {
        &self.entity
    }

    pub fn model_label(&self) -> &str {
        &self.model_label
    }

    pub fn plural_label(&self) -> &str {
        &self.plural_label
    }

    pub fn navigation(&self) -> &Navigation {
        &self.navigation
    }

    pub fn schema(&self) -> &ResourceSchema {
        &self.schema
    }

    /// Form fields in display order.
    pub fn form_fields(&self) -> &[FieldDescriptor] {
        &self.schema.form_fields
    }

    /// Table columns in display order.
    pub fn table_columns(&self) -> &[TableColumn] {
        &self.schema.table_columns
    }

    pub fn filters(&self) -> &[FilterSpec] {
        &self.schema.filters
    }

    pub fn associations(&self) -> &[Association] {
        &self.associations
    }

    /// Looks up a declared association.
    pub fn association(&self, name: &str) -> Result<&Association, SchemaError> {
        self.associations
            .iter()
            .find(|a| a.name == name)
            .ok_or_else(|| SchemaError::UnknownAssociation {
                resource: self.name.clone(),
                association: name.to_string(),
            })
    }

    pub fn title_attribute(&self) -> Option<&str> {
        self.title_attribute.as_deref()
    }

    pub fn searchable_attributes(&self) -> &[String] {
        &self.schema.searchable_attributes
    }

    pub fn search_details(&self) -> &[SearchDetail] {
        &self.search_details
    }

    /// True if global search covers this resource.
    pub fn is_globally_searchable(&self) -> bool {
        self.title_attribute.is_some() && !self.schema.searchable_attributes.is_empty()
    }

    pub fn pages(&self) -> &[PageRoute] {
        &self.pages
    }

    /// URL of a named page, relative to the panel root.
    pub fn url(&self, page: &str, record: Option<&str>) -> Option<String> {
        let route = self.pages.iter().find(|p| p.name == page)?;
        let path = match record {
            Some(id) => route.path.replace("{record}", id),
            None if route.path.contains("{record}") => return None,
            None => route.path.clone(),
        };
        if path == "/" {
            Some(format!("/{}", self.name))
        } else {
            Some(format!("/{}{}", self.name, path))
        }
    }

    /// URL of the edit page of a record.
    pub fn edit_url(&self, id: &str) -> String {
        self.url("edit", Some(id))
            .unwrap_or_else(|| format!("/{}/{}/edit", self.name, id))
    }

    /// The global search query: any searchable attribute contains `term`,
    /// with the search includes eager-loaded, at most `limit` records.
    pub fn build_search_query(&self, term: &str, limit: usize) -> Query {
        let conditions = self
            .schema
            .searchable_attributes
            .iter()
            .map(|attribute| Condition::contains(attribute, term.trim()))
            .collect();

        let mut query = Query::select(&self.entity).filter_any(conditions);
        for name in &self.search_includes {
            if let Ok(association) = self.association(name) {
                query = query.with(association.clone());
            }
        }
        query.limit(limit as u64)
    }

    pub(crate) fn pattern(&self, field: &str) -> Option<&Regex> {
        self.patterns.get(field)
    }
}

/// Builder for [`ResourceDefinition`].
#[derive(Debug, Clone)]
pub struct ResourceDefinitionBuilder {
    name: String,
    entity: String,
    model_label: Option<String>,
    plural_label: Option<String>,
    navigation: Option<Navigation>,
    schema: ResourceSchema,
    associations: Vec<Association>,
    title_attribute: Option<String>,
    search_includes: Vec<String>,
    search_details: Vec<SearchDetail>,
    pages: Vec<PageRoute>,
    default_page_size: u64,
    max_page_size: u64,
}

impl ResourceDefinitionBuilder {
    fn new(name: String, entity: String) -> Self {
        let config = AdminConfig::default();
        Self {
            schema: ResourceSchema::new(name.clone()),
            name,
            entity,
            model_label: None,
            plural_label: None,
            navigation: None,
            associations: Vec::new(),
            title_attribute: None,
            search_includes: Vec::new(),
            search_details: Vec::new(),
            pages: vec![
                PageRoute::new("index", "/"),
                PageRoute::new("create", "/create"),
                PageRoute::new("edit", "/{record}/edit"),
            ],
            default_page_size: config.default_page_size,
            max_page_size: config.max_page_size,
        }
    }

    /// Singular and plural display labels.
    pub fn labels(mut self, singular: impl Into<String>, plural: impl Into<String>) -> Self {
        self.model_label = Some(singular.into());
        self.plural_label = Some(plural.into());
        self
    }

    pub fn navigation(mut self, navigation: Navigation) -> Self {
        self.navigation = Some(navigation);
        self
    }

    /// Takes page sizes from the engine configuration.
    pub fn config(mut self, config: &AdminConfig) -> Self {
        self.default_page_size = config.default_page_size;
        self.max_page_size = config.max_page_size;
        self
    }

    pub fn association(mut self, association: Association) -> Self {
        self.associations.push(association);
        self
    }

    pub fn field(mut self, field: FieldDescriptor) -> Self {
        self.schema.form_fields.push(field);
        self
    }

    pub fn column(mut self, column: TableColumn) -> Self {
        self.schema.table_columns.push(column);
        self
    }

    pub fn filter(mut self, filter: FilterSpec) -> Self {
        self.schema.filters.push(filter);
        self
    }

    /// Enables global search with a title attribute and the matched attributes.
    pub fn globally_searchable<S: Into<String>>(
        mut self,
        title_attribute: impl Into<String>,
        attributes: impl IntoIterator<Item = S>,
    ) -> Self {
        self.title_attribute = Some(title_attribute.into());
        self.schema.searchable_attributes = attributes.into_iter().map(Into::into).collect();
        self
    }

    /// Eager-loads an association in global search queries.
    pub fn search_include(mut self, association: impl Into<String>) -> Self {
        self.search_includes.push(association.into());
        self
    }

    /// Adds a detail line to global search hits.
    pub fn search_detail(mut self, label: impl Into<String>, path: impl Into<String>) -> Self {
        self.search_details.push(SearchDetail {
            label: label.into(),
            path: path.into(),
        });
        self
    }

    /// Replaces the page set.
    pub fn pages(mut self, pages: Vec<PageRoute>) -> Self {
        self.pages = pages;
        self
    }

    /// Checks every invariant and produces the definition.
    pub fn build(mut self) -> Result<ResourceDefinition, SchemaError> {
        self.schema.check(&self.associations)?;

        let mut patterns = HashMap::new();
        for field in &self.schema.form_fields {
            if let Some(pattern) = &field.constraints.pattern {
                let regex = Regex::new(pattern).map_err(|e| SchemaError::InvalidPattern {
                    field: field.name.clone(),
                    message: e.to_string(),
                })?;
                patterns.insert(field.name.clone(), regex);
            }

            if let FieldKind::Relation {
                association,
                multiple,
                ..
            } = &field.kind
            {
                let association = self.find_association(association)?;
                if association.key_field() != field.name || association.is_many() != *multiple {
                    return Err(SchemaError::InvalidConfig {
                        message: format!(
                            "relation field '{}' does not match the key of association '{}'",
                            field.name, association.name
                        ),
                    });
                }
            }
        }

        // bind relation filters to the key their association is stored under
        let mut filters = std::mem::take(&mut self.schema.filters);
        for filter in &mut filters {
            if let FilterSpec::RelationEnum(relation) = filter {
                relation.key_field = self.find_association(&relation.association)?.key_field().to_string();
            }
        }
        self.schema.filters = filters;

        if let Some(attribute) = &self.title_attribute {
            if !self.schema.has_attribute(attribute) {
                return Err(SchemaError::UnknownTitleAttribute {
                    resource: self.name.clone(),
                    attribute: attribute.clone(),
                });
            }
        }

        for include in &self.search_includes {
            self.find_association(include)?;
        }

        for detail in &self.search_details {
            match detail.path.split_once('.') {
                Some((association, _)) => {
                    self.find_association(association)?;
                    if !self.search_includes.iter().any(|i| i == association) {
                        return Err(SchemaError::DetailNotEagerLoaded {
                            resource: self.name.clone(),
                            path: detail.path.clone(),
                            association: association.to_string(),
                        });
                    }
                }
                None if !self.schema.has_attribute(&detail.path) => {
                    return Err(SchemaError::UnknownField {
                        resource: self.name.clone(),
                        field: detail.path.clone(),
                    });
                }
                None => {}
            }
        }

        if self.default_page_size == 0 || self.max_page_size < self.default_page_size {
            return Err(SchemaError::InvalidConfig {
                message: format!(
                    "invalid page sizes for resource '{}': default {}, max {}",
                    self.name, self.default_page_size, self.max_page_size
                ),
            });
        }

        let plural_label = self
            .plural_label
            .unwrap_or_else(|| humanize(&self.name));
        let model_label = self.model_label.unwrap_or_else(|| plural_label.clone());
        let navigation = self.navigation.unwrap_or_else(|| Navigation {
            label: plural_label.clone(),
            icon: None,
            group: None,
            sort: 0,
        });

        debug!(
            resource = %self.name,
            fields = self.schema.form_fields.len(),
            columns = self.schema.table_columns.len(),
            filters = self.schema.filters.len(),
            "Built resource definition"
        );

        Ok(ResourceDefinition {
            name: self.name,
            entity: self.entity,
            model_label,
            plural_label,
            navigation,
            schema: self.schema,
            associations: self.associations,
            title_attribute: self.title_attribute,
            search_includes: self.search_includes,
            search_details: self.search_details,
            pages: self.pages,
            default_page_size: self.default_page_size,
            max_page_size: self.max_page_size,
            patterns,
        })
    }

    fn find_association(&self, name: &str) -> Result<&Association, SchemaError> {
        self.associations
            .iter()
            .find(|a| a.name == name)
            .ok_or_else(|| SchemaError::UnknownAssociation {
                resource: self.name.clone(),
                association: name.to_string(),
            })
    }
}
