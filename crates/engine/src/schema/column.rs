//! List table column descriptors.

use serde::{Deserialize, Serialize};

use super::field::humanize;

/// How a column renders its value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnKind {
    Text,
    Image,
    /// A true/false icon.
    Boolean,
    /// A value formatted as a date.
    Date,
}

/// One column of a resource's list table.
///
/// `path` names a form field, a system attribute, or an `association.field`
/// path into an eager-loaded related record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableColumn {
    pub path: String,
    pub label: String,
    pub kind: ColumnKind,
    #[serde(default)]
    pub sortable: bool,
    #[serde(default)]
    pub searchable: bool,
    /// The user may hide the column.
    #[serde(default)]
    pub toggleable: bool,
}

impl TableColumn {
    pub fn new(path: impl Into<String>, kind: ColumnKind) -> Self {
        let path = path.into();
        Self {
            label: humanize(&path),
            path,
            kind,
            sortable: false,
            searchable: false,
            toggleable: false,
        }
    }

    pub fn text(path: impl Into<String>) -> Self {
        Self::new(path, ColumnKind::Text)
    }

    pub fn image(path: impl Into<String>) -> Self {
        Self::new(path, ColumnKind::Image)
    }

    pub fn boolean(path: impl Into<String>) -> Self {
        Self::new(path, ColumnKind::Boolean)
    }

    pub fn date(path: impl Into<String>) -> Self {
        Self::new(path, ColumnKind::Date)
    }

    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    pub fn sortable(mut self) -> Self {
        self.sortable = true;
        self
    }

    pub fn searchable(mut self) -> Self {
        self.searchable = true;
        self
    }

    pub fn toggleable(mut self) -> Self {
        self.toggleable = true;
        self
    }

    /// Splits a dotted path into `(association, field)`.
    pub fn relation_path(&self) -> Option<(&str, &str)> {
        self.path.split_once('.')
    }

    /// True when the column reads a field of the record itself.
    pub fn is_direct(&self) -> bool {
        !self.path.contains('.')
    }
}
