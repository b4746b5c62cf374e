//! Generic request-parameter filtering
//!
//! A [`FilterSet`] declares which query parameters are recognized and the
//! column each one is matched against. Every supplied parameter becomes a
//! case-insensitive substring match, and the matches are OR-ed together into
//! a single predicate appended to the query being built.

use std::collections::HashMap;

use sqlx::{Postgres, QueryBuilder};

use crate::error::{AppError, AppResult};

/// Longest accepted filter value
pub const MAX_FILTER_LEN: usize = 200;

/// One recognized parameter and the column it searches
#[derive(Debug, Clone, Copy)]
pub struct TextFilter {
    pub param: &'static str,
    pub column: &'static str,
}

/// Declared set of text filters for one collection
#[derive(Debug, Clone, Copy)]
pub struct FilterSet {
    filters: &'static [TextFilter],
}

impl FilterSet {
    pub const fn new(filters: &'static [TextFilter]) -> Self {
        Self { filters }
    }

    /// Resolve supplied parameters into `(column, ILIKE pattern)` pairs,
    /// in declaration order. Unknown and blank parameters are ignored.
    pub fn terms(&self, params: &HashMap<String, String>) -> AppResult<Vec<(&'static str, String)>> {
        let mut terms = Vec::new();

        for filter in self.filters {
            let Some(value) = params.get(filter.param) else {
                continue;
            };
            let value = value.trim();
            if value.is_empty() {
                continue;
            }
            if value.chars().count() > MAX_FILTER_LEN {
                return Err(AppError::Validation(format!(
                    "Filter '{}' exceeds {} characters",
                    filter.param, MAX_FILTER_LEN
                )));
            }
            terms.push((filter.column, format!("%{}%", escape_like(value))));
        }

        Ok(terms)
    }

    /// Append ` AND (col ILIKE $n OR ...)` for the supplied parameters
    pub fn push_predicate(
        &self,
        builder: &mut QueryBuilder<'_, Postgres>,
        params: &HashMap<String, String>,
    ) -> AppResult<()> {
        let terms = self.terms(params)?;
        if terms.is_empty() {
            return Ok(());
        }

        builder.push(" AND (");
        for (i, (column, pattern)) in terms.into_iter().enumerate() {
            if i > 0 {
                builder.push(" OR ");
            }
            builder.push(column);
            builder.push(" ILIKE ");
            builder.push_bind(pattern);
        }
        builder.push(")");

        Ok(())
    }
}

/// Escape LIKE wildcards so user input only ever matches literally
pub fn escape_like(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        if matches!(c, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// Collect the non-empty optional values of a typed query into a parameter map
pub fn params<const N: usize>(pairs: [(&str, &Option<String>); N]) -> HashMap<String, String> {
    pairs
        .into_iter()
        .filter_map(|(name, value)| value.as_ref().map(|v| (name.to_string(), v.clone())))
        .collect()
}
