//! Typed row filters for PostgREST query strings.
//!
//! `RowQuery::table("legal_documents").select(&["id"]).filter(Filter::is_null("server_path"))`
//! renders to `select=id&server_path=is.null`.

/// Characters left unescaped in parameter values, matching what PostgREST
/// expects to read literally in filter expressions.
const LITERAL_CHARS: &[(&str, &str)] = &[("%2A", "*"), ("%2C", ","), ("%28", "("), ("%29", ")")];

/// Characters that force a value to be quoted inside an `or=(...)` group.
const RESERVED_IN_GROUP: &[char] = &[',', '.', ':', '(', ')', '"'];

/// A single row filter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Filter {
    /// `column = value`
    Eq(String, String),
    /// `column IS NULL`
    IsNull(String),
    /// `column IS NOT NULL`
    NotNull(String),
    /// Any of the nested filters holds.
    Or(Vec<Filter>),
}

impl Filter {
    pub fn eq(column: impl Into<String>, value: impl Into<String>) -> Self {
        Filter::Eq(column.into(), value.into())
    }

    pub fn is_null(column: impl Into<String>) -> Self {
        Filter::IsNull(column.into())
    }

    pub fn not_null(column: impl Into<String>) -> Self {
        Filter::NotNull(column.into())
    }

    pub fn or(filters: impl IntoIterator<Item = Filter>) -> Self {
        Filter::Or(filters.into_iter().collect())
    }

    /// Render as a top-level `(key, value)` query parameter.
    pub fn to_param(&self) -> (String, String) {
        match self {
            Filter::Eq(col, value) => (col.clone(), format!("eq.{}", value)),
            Filter::IsNull(col) => (col.clone(), "is.null".to_string()),
            Filter::NotNull(col) => (col.clone(), "not.is.null".to_string()),
            Filter::Or(filters) => ("or".to_string(), format!("({})", render_group(filters))),
        }
    }

    /// Render inside a logical group (`col.op.value`).
    fn to_group_item(&self) -> String {
        match self {
            Filter::Eq(col, value) => format!("{}.eq.{}", col, quote_group_value(value)),
            Filter::IsNull(col) => format!("{}.is.null", col),
            Filter::NotNull(col) => format!("{}.not.is.null", col),
            Filter::Or(filters) => format!("or({})", render_group(filters)),
        }
    }
}

fn render_group(filters: &[Filter]) -> String {
    filters
        .iter()
        .map(Filter::to_group_item)
        .collect::<Vec<_>>()
        .join(",")
}

fn quote_group_value(value: &str) -> String {
    if value.contains(RESERVED_IN_GROUP) {
        format!("\"{}\"", value.replace('\\', "\\\\").replace('"', "\\\""))
    } else {
        value.to_string()
    }
}

/// A read against one table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowQuery {
    table: String,
    select: Vec<String>,
    filters: Vec<Filter>,
    limit: Option<usize>,
}

impl RowQuery {
    /// Start a query selecting every column of `table`.
    pub fn table(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            select: Vec::new(),
            filters: Vec::new(),
            limit: None,
        }
    }

    /// Restrict the projection to `columns`.
    pub fn select(mut self, columns: &[&str]) -> Self {
        self.select = columns.iter().map(|c| c.to_string()).collect();
        self
    }

    pub fn filter(mut self, filter: Filter) -> Self {
        self.filters.push(filter);
        self
    }

    /// Cap the number of rows returned. Zero means no cap.
    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = (limit > 0).then_some(limit);
        self
    }

    pub fn table_name(&self) -> &str {
        &self.table
    }

    pub fn filters(&self) -> &[Filter] {
        &self.filters
    }

    pub fn row_limit(&self) -> Option<usize> {
        self.limit
    }

    /// Query parameters in request order: projection, filters, limit.
    pub fn params(&self) -> Vec<(String, String)> {
        let select = if self.select.is_empty() {
            "*".to_string()
        } else {
            self.select.join(",")
        };

        let mut params = vec![("select".to_string(), select)];
        params.extend(self.filters.iter().map(Filter::to_param));
        if let Some(limit) = self.limit {
            params.push(("limit".to_string(), limit.to_string()));
        }
        params
    }

    /// Encoded query string, without the leading `?`.
    pub fn to_query_string(&self) -> String {
        encode_params(&self.params())
    }
}

/// Encode `(key, value)` pairs as a query string.
pub fn encode_params(params: &[(String, String)]) -> String {
    params
        .iter()
        .map(|(k, v)| format!("{}={}", encode_component(k), encode_component(v)))
        .collect::<Vec<_>>()
        .join("&")
}

fn encode_component(value: &str) -> String {
    let mut encoded = urlencoding::encode(value).into_owned();
    for (escaped, literal) in LITERAL_CHARS {
        encoded = encoded.replace(escaped, literal);
    }
    encoded
}
