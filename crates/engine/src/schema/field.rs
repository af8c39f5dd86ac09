//! Form field descriptors.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One option of a select field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectOption {
    /// The stored value.
    pub value: String,
    /// The displayed label.
    pub label: String,
}

impl SelectOption {
    /// Creates a new option.
    pub fn new(value: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            label: label.into(),
        }
    }
}

/// The kind of a form field, with kind-specific settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FieldKind {
    /// Single-line text.
    Text,
    /// A number, accepted as a JSON number or a numeric string.
    Number,
    /// A toggle.
    Boolean,
    /// A calendar date (`YYYY-MM-DD`) or timestamp.
    Date,
    /// One value out of a fixed option list.
    Select { options: Vec<SelectOption> },
    /// A reference to records of another entity.
    Relation {
        /// Association that resolves the reference.
        association: String,
        /// Field of the related record shown as the option label.
        label_field: String,
        /// Whether several records can be selected.
        multiple: bool,
    },
    /// An uploaded image, stored as a path.
    Image {
        directory: String,
        preserve_filenames: bool,
    },
    /// Long-form markdown text.
    Markdown,
}

impl FieldKind {
    /// Short name used in error messages.
    pub fn name(&self) -> &'static str {
        match self {
            FieldKind::Text => "text",
            FieldKind::Number => "number",
            FieldKind::Boolean => "boolean",
            FieldKind::Date => "date",
            FieldKind::Select { .. } => "select",
            FieldKind::Relation { .. } => "relation",
            FieldKind::Image { .. } => "image",
            FieldKind::Markdown => "markdown",
        }
    }
}

/// Validation constraints attached to a field.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Constraints {
    #[serde(default)]
    pub required: bool,
    /// Unique across the entity, ignoring the record being edited.
    #[serde(default)]
    pub unique: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
    /// Regular expression the textual value must match.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,
}

/// How a field value is computed from another field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Derivation {
    /// URL slug of an earlier text field. Applied on create only.
    Slug { source: String },
}

impl Derivation {
    /// The field this derivation reads.
    pub fn source(&self) -> &str {
        match self {
            Derivation::Slug { source } => source,
        }
    }
}

/// Value applied on create when the field is absent from the payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldDefault {
    Value(Value),
    /// The current date, as `YYYY-MM-DD`.
    Today,
}

/// Describes one field of a resource form.
///
/// Descriptors are plain configuration. They are assembled with the
/// chaining helpers below and checked when the owning resource is built.
///
/// ```
/// use shopdesk_engine::schema::{FieldDescriptor, FieldKind};
///
/// let quantity = FieldDescriptor::number("quantity").required().min(0.0).max(100.0);
/// assert_eq!(quantity.kind, FieldKind::Number);
/// assert_eq!(quantity.constraints.max, Some(100.0));
/// assert_eq!(quantity.label, "Quantity");
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldDescriptor {
    pub name: String,
    pub label: String,
    pub kind: FieldKind,
    #[serde(default)]
    pub constraints: Constraints,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub derivation: Option<Derivation>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<FieldDefault>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub helper_text: Option<String>,
    /// Form section the field is rendered in.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub section: Option<String>,
    /// Rendered read-only.
    #[serde(default)]
    pub disabled: bool,
    /// Kept in the validated payload. When false the field is display-only.
    #[serde(default = "default_true")]
    pub dehydrated: bool,
}

fn default_true() -> bool {
    true
}

impl FieldDescriptor {
    /// Creates a field of the given kind with a label derived from its name.
    pub fn new(name: impl Into<String>, kind: FieldKind) -> Self {
        let name = name.into();
        Self {
            label: humanize(&name),
            name,
            kind,
            constraints: Constraints::default(),
            derivation: None,
            default: None,
            helper_text: None,
            section: None,
            disabled: false,
            dehydrated: true,
        }
    }

    pub fn text(name: impl Into<String>) -> Self {
        Self::new(name, FieldKind::Text)
    }

    pub fn number(name: impl Into<String>) -> Self {
        Self::new(name, FieldKind::Number)
    }

    pub fn boolean(name: impl Into<String>) -> Self {
        Self::new(name, FieldKind::Boolean)
    }

    pub fn date(name: impl Into<String>) -> Self {
        Self::new(name, FieldKind::Date)
    }

    pub fn markdown(name: impl Into<String>) -> Self {
        Self::new(name, FieldKind::Markdown)
    }

    /// A select field over `(value, label)` pairs.
    pub fn select<V, L>(name: impl Into<String>, options: impl IntoIterator<Item = (V, L)>) -> Self
    where
        V: Into<String>,
        L: Into<String>,
    {
        let options = options
            .into_iter()
            .map(|(value, label)| SelectOption::new(value, label))
            .collect();
        Self::new(name, FieldKind::Select { options })
    }

    /// A single-valued relation field holding a foreign key.
    pub fn belongs_to(
        name: impl Into<String>,
        association: impl Into<String>,
        label_field: impl Into<String>,
    ) -> Self {
        Self::new(
            name,
            FieldKind::Relation {
                association: association.into(),
                label_field: label_field.into(),
                multiple: false,
            },
        )
    }

    /// A multi-valued relation field holding an array of identifiers.
    pub fn belongs_to_many(
        name: impl Into<String>,
        association: impl Into<String>,
        label_field: impl Into<String>,
    ) -> Self {
        Self::new(
            name,
            FieldKind::Relation {
                association: association.into(),
                label_field: label_field.into(),
                multiple: true,
            },
        )
    }

    pub fn image(name: impl Into<String>, directory: impl Into<String>) -> Self {
        Self::new(
            name,
            FieldKind::Image {
                directory: directory.into(),
                preserve_filenames: false,
            },
        )
    }

    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    pub fn required(mut self) -> Self {
        self.constraints.required = true;
        self
    }

    pub fn unique(mut self) -> Self {
        self.constraints.unique = true;
        self
    }

    pub fn min(mut self, min: f64) -> Self {
        self.constraints.min = Some(min);
        self
    }

    pub fn max(mut self, max: f64) -> Self {
        self.constraints.max = Some(max);
        self
    }

    /// Sets a regular expression constraint. Compiled when the resource is built.
    pub fn pattern(mut self, pattern: impl Into<String>) -> Self {
        self.constraints.pattern = Some(pattern.into());
        self
    }

    /// Derives this field as the slug of `source` on create.
    pub fn slug_of(mut self, source: impl Into<String>) -> Self {
        self.derivation = Some(Derivation::Slug {
            source: source.into(),
        });
        self
    }

    pub fn default_value(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(FieldDefault::Value(value.into()));
        self
    }

    pub fn default_today(mut self) -> Self {
        self.default = Some(FieldDefault::Today);
        self
    }

    pub fn helper_text(mut self, text: impl Into<String>) -> Self {
        self.helper_text = Some(text.into());
        self
    }

    pub fn section(mut self, section: impl Into<String>) -> Self {
        self.section = Some(section.into());
        self
    }

    pub fn disabled(mut self) -> Self {
        self.disabled = true;
        self
    }

    pub fn dehydrated(mut self, dehydrated: bool) -> Self {
        self.dehydrated = dehydrated;
        self
    }

    /// Keeps the original file name of uploads. No effect on other kinds.
    pub fn preserve_filenames(mut self) -> Self {
        if let FieldKind::Image {
            preserve_filenames, ..
        } = &mut self.kind
        {
            *preserve_filenames = true;
        }
        self
    }

    /// The association name if this is a relation field.
    pub fn association(&self) -> Option<&str> {
        match &self.kind {
            FieldKind::Relation { association, .. } => Some(association),
            _ => None,
        }
    }
}

/// Turns `published_at` into `Published at`.
pub(crate) fn humanize(name: &str) -> String {
    let spaced = name.replace(['_', '.'], " ");
    let mut chars = spaced.trim().chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_humanize() {
        assert_eq!(humanize("published_at"), "Published at");
        assert_eq!(humanize("brand.name"), "Brand name");
        assert_eq!(humanize(""), "");
    }

    #[test]
    fn test_select_options() {
        let field = FieldDescriptor::select("type", [("downloadable", "Downloadable")]);
        match field.kind {
            FieldKind::Select { options } => {
                assert_eq!(options, vec![SelectOption::new("downloadable", "Downloadable")]);
            }
            other => panic!("unexpected kind {other:?}"),
        }
    }

    #[test]
    fn test_preserve_filenames_only_on_images() {
        let image = FieldDescriptor::image("image", "form-attachments").preserve_filenames();
        assert_eq!(
            image.kind,
            FieldKind::Image {
                directory: "form-attachments".to_string(),
                preserve_filenames: true,
            }
        );

        let text = FieldDescriptor::text("name").preserve_filenames();
        assert_eq!(text.kind, FieldKind::Text);
    }

    #[test]
    fn test_descriptor_deserializes_with_defaults() {
        let field: FieldDescriptor = serde_json::from_value(serde_json::json!({
            "name": "sku",
            "label": "SKU",
            "kind": {"type": "text"}
        }))
        .unwrap();

        assert!(field.dehydrated);
        assert!(!field.constraints.required);
        assert!(field.derivation.is_none());
    }
}
