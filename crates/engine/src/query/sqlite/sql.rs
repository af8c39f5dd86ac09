//! Translation of [`Query`] values into SQL over the `records` table.
//!
//! Field values live in the JSON `fields` column and are read with
//! `json_extract`. System attributes map to real columns. Every literal is
//! bound as a numbered parameter.

use serde_json::Value;

use crate::query::value::{parse_datetime, timestamp};
use crate::query::{AssociationKind, Condition, Op, Query, SYSTEM_ATTRIBUTES, SortDirection, SortKey};

/// A fragment of SQL with bound parameters.
#[derive(Debug, Clone, Default)]
pub struct SqlFragment {
    /// The SQL clause.
    pub sql: String,
    /// Bound parameter values.
    pub params: Vec<SqlParam>,
}

/// A bound SQL parameter.
#[derive(Debug, Clone, PartialEq)]
pub enum SqlParam {
    String(String),
    Integer(i64),
    Float(f64),
    Null,
}

impl SqlParam {
    pub fn string(s: impl Into<String>) -> Self {
        SqlParam::String(s.into())
    }

    /// Converts a JSON scalar. Booleans bind as 0/1, matching `json_extract`.
    fn from_json(value: &Value) -> Self {
        match value {
            Value::Null => SqlParam::Null,
            Value::Bool(b) => SqlParam::Integer(i64::from(*b)),
            Value::Number(n) => match n.as_i64() {
                Some(i) => SqlParam::Integer(i),
                None => SqlParam::Float(n.as_f64().unwrap_or_default()),
            },
            Value::String(s) => SqlParam::String(s.clone()),
            other => SqlParam::String(other.to_string()),
        }
    }

    /// Boxes the parameter for `rusqlite` binding.
    pub fn to_boxed(&self) -> Box<dyn rusqlite::ToSql> {
        match self {
            SqlParam::String(s) => Box::new(s.clone()),
            SqlParam::Integer(i) => Box::new(*i),
            SqlParam::Float(f) => Box::new(*f),
            SqlParam::Null => Box::new(Option::<String>::None),
        }
    }
}

impl SqlFragment {
    /// Creates a new SQL fragment.
    pub fn new(sql: impl Into<String>) -> Self {
        Self {
            sql: sql.into(),
            params: Vec::new(),
        }
    }

    /// Adds a parameter and returns its placeholder.
    pub fn add_param(&mut self, param: SqlParam) -> String {
        self.params.push(param);
        format!("?{}", self.params.len())
    }

    /// Appends a clause with AND.
    pub fn and(&mut self, clause: &str) {
        if clause.is_empty() {
            return;
        }
        if self.sql.is_empty() {
            self.sql = clause.to_string();
        } else {
            self.sql = format!("{} AND ({})", self.sql, clause);
        }
    }

    /// Returns true if this fragment is empty.
    pub fn is_empty(&self) -> bool {
        self.sql.is_empty()
    }

    /// Boxed parameters in placeholder order.
    pub fn bound_params(&self) -> Vec<Box<dyn rusqlite::ToSql>> {
        self.params.iter().map(SqlParam::to_boxed).collect()
    }
}

/// Scalar function lowering text with full Unicode case mapping. Registered
/// on every pooled connection; the built-in `LOWER` only folds ASCII.
pub const UNICODE_LOWER: &str = "unicode_lower";

/// JSON path of a top-level key.
fn json_path(field: &str) -> String {
    format!("$.\"{}\"", field.replace('"', "\\\""))
}

fn is_system(field: &str) -> bool {
    SYSTEM_ATTRIBUTES.contains(&field)
}

fn is_timestamp_column(field: &str) -> bool {
    matches!(field, "created_at" | "updated_at")
}

/// Escapes `LIKE` wildcards with `\`.
fn escape_like(s: &str) -> String {
    let mut escaped = String::with_capacity(s.len());
    for c in s.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// Builds SQL for queries over one table alias.
pub struct SqlTranslator<'a> {
    alias: &'a str,
}

impl Default for SqlTranslator<'_> {
    fn default() -> Self {
        Self { alias: "records" }
    }
}

impl<'a> SqlTranslator<'a> {
    pub fn new(alias: &'a str) -> Self {
        Self { alias }
    }

    /// SQL expression reading a field or system attribute.
    pub fn field_expr(&self, frag: &mut SqlFragment, field: &str) -> String {
        if is_system(field) {
            format!("{}.{}", self.alias, field)
        } else {
            let path = frag.add_param(SqlParam::string(json_path(field)));
            format!("json_extract({}.fields, {})", self.alias, path)
        }
    }

    /// The WHERE clause body: entity restriction plus every condition.
    pub fn where_clause(&self, query: &Query) -> SqlFragment {
        let mut frag = SqlFragment::default();
        let entity = frag.add_param(SqlParam::string(&query.entity));
        frag.sql = format!("{}.entity = {}", self.alias, entity);

        for condition in &query.conditions {
            let clause = self.condition(&mut frag, condition);
            frag.and(&clause);
        }
        frag
    }

    fn condition(&self, frag: &mut SqlFragment, condition: &Condition) -> String {
        match condition {
            Condition::Compare { field, op, value } => self.compare(frag, field, *op, value),
            Condition::In { field, values } => self.in_list(frag, field, values),
            Condition::Any { conditions } => {
                if conditions.is_empty() {
                    return "0".to_string();
                }
                let parts: Vec<String> = conditions
                    .iter()
                    .map(|c| format!("({})", self.condition(frag, c)))
                    .collect();
                parts.join(" OR ")
            }
            Condition::Related {
                association,
                condition,
            } => {
                let alias = format!("{}_rel", self.alias);
                let entity = frag.add_param(SqlParam::string(&association.target_entity));
                let key_path = frag.add_param(SqlParam::string(json_path(association.key_field())));
                let inner = SqlTranslator::new(&alias).condition(frag, condition);
                format!(
                    "EXISTS (SELECT 1 FROM records AS {alias} WHERE {alias}.entity = {entity} \
                     AND {alias}.id IN (SELECT value FROM json_each({}.fields, {key_path})) \
                     AND ({inner}))",
                    self.alias
                )
            }
        }
    }

    fn compare(&self, frag: &mut SqlFragment, field: &str, op: Op, value: &Value) -> String {
        let expr = self.field_expr(frag, field);

        let operator = match op {
            Op::IsNull => return format!("{expr} IS NULL"),
            Op::NotNull => return format!("{expr} IS NOT NULL"),
            Op::Eq if value.is_null() => return format!("{expr} IS NULL"),
            Op::Ne if value.is_null() => return format!("{expr} IS NOT NULL"),
            Op::Contains => {
                let needle = value.as_str().unwrap_or_default().to_lowercase();
                let pattern = frag.add_param(SqlParam::String(format!("%{}%", escape_like(&needle))));
                return format!("{UNICODE_LOWER}(CAST({expr} AS TEXT)) LIKE {pattern} ESCAPE '\\'");
            }
            Op::Eq => "=",
            Op::Ne => "<>",
            Op::Gt => ">",
            Op::Gte => ">=",
            Op::Lt => "<",
            Op::Lte => "<=",
        };

        match value.as_str().and_then(parse_datetime) {
            // canonical timestamps compare correctly as text
            Some(at) if is_timestamp_column(field) => {
                let placeholder = frag.add_param(SqlParam::String(timestamp(&at)));
                format!("{expr} {operator} {placeholder}")
            }
            Some(_) => {
                let placeholder = frag.add_param(SqlParam::from_json(value));
                format!("julianday({expr}) {operator} julianday({placeholder})")
            }
            None => {
                let placeholder = frag.add_param(SqlParam::from_json(value));
                format!("{expr} {operator} {placeholder}")
            }
        }
    }

    fn in_list(&self, frag: &mut SqlFragment, field: &str, values: &[Value]) -> String {
        if values.is_empty() {
            return "0".to_string();
        }

        if is_system(field) {
            let expr = self.field_expr(frag, field);
            let placeholders = self.placeholders(frag, values);
            return format!("{expr} IN ({placeholders})");
        }

        // json_each yields the scalar itself or each element of an array
        let path = frag.add_param(SqlParam::string(json_path(field)));
        let placeholders = self.placeholders(frag, values);
        format!(
            "EXISTS (SELECT 1 FROM json_each({}.fields, {}) WHERE json_each.value IN ({}))",
            self.alias, path, placeholders
        )
    }

    fn placeholders(&self, frag: &mut SqlFragment, values: &[Value]) -> String {
        values
            .iter()
            .map(|v| frag.add_param(SqlParam::from_json(v)))
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// Builds an ORDER BY clause. Ties fall back to insertion order.
    pub fn order_by(&self, frag: &mut SqlFragment, query: &Query) -> String {
        let mut clauses: Vec<String> = query
            .sort
            .iter()
            .map(|key| {
                let dir = match key.direction {
                    SortDirection::Ascending => "ASC",
                    SortDirection::Descending => "DESC",
                };
                format!("{} {}", self.sort_expr(frag, key), dir)
            })
            .collect();

        clauses.push(format!("{}.seq ASC", self.alias));
        format!("ORDER BY {}", clauses.join(", "))
    }

    fn sort_expr(&self, frag: &mut SqlFragment, key: &SortKey) -> String {
        let Some(association) = &key.related else {
            return self.field_expr(frag, &key.field);
        };

        let related = SqlTranslator::new("related");
        let value = related.field_expr(frag, &key.field);
        let entity = frag.add_param(SqlParam::string(&association.target_entity));
        let key_path = match &association.kind {
            AssociationKind::BelongsTo { foreign_key } => json_path(foreign_key),
            AssociationKind::BelongsToMany { ids_field } => format!("{}[0]", json_path(ids_field)),
        };
        let key_path = frag.add_param(SqlParam::String(key_path));

        format!(
            "(SELECT {value} FROM records AS related WHERE related.entity = {entity} AND related.id = json_extract({}.fields, {key_path}))",
            self.alias
        )
    }

    /// Builds a LIMIT clause, empty when the query is unpaginated.
    ///
    /// SQLite reads both numbers as signed 64-bit integers, so larger values
    /// are clamped to `i64::MAX`.
    pub fn limit(&self, query: &Query) -> String {
        let clamp = |n: u64| i64::try_from(n).unwrap_or(i64::MAX);
        match (query.limit.map(clamp), query.offset.map(clamp)) {
            (Some(limit), Some(offset)) => format!("LIMIT {} OFFSET {}", limit, offset),
            (Some(limit), None) => format!("LIMIT {}", limit),
            (None, Some(offset)) => format!("LIMIT -1 OFFSET {}", offset),
            (None, None) => String::new(),
        }
    }
}
