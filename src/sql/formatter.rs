//! SQL formatting
//!
//! Pretty-prints SQL for display using the sqlformat crate.

use sqlformat::{FormatOptions, Indent, QueryParams, format};

/// Format a SQL query string for display
///
/// # Examples
/// ```
/// let formatted = querygate::sql::format_sql("select id from users where id=1");
/// assert!(formatted.contains("SELECT"));
/// ```
pub fn format_sql(sql: &str) -> String {
    format_sql_with_indent(sql, 2)
}

/// Format SQL with custom indentation
pub fn format_sql_with_indent(sql: &str, indent_size: u8) -> String {
    format(
        sql,
        &QueryParams::None,
        &FormatOptions {
            indent: Indent::Spaces(indent_size),
            uppercase: Some(true),
            lines_between_queries: 1,
            ..Default::default()
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_simple_query() {
        let formatted = format_sql("select * from users");
        assert!(formatted.contains("SELECT"));
        assert!(formatted.contains("FROM"));
    }

    #[test]
    fn test_format_with_where() {
        let formatted = format_sql("select id,name from users where active=true");
        assert!(formatted.contains("WHERE"));
    }

    #[test]
    fn test_format_with_custom_indent() {
        let formatted = format_sql_with_indent("select a, b from users", 4);
        assert!(formatted.contains("\n    a"));
    }
}
