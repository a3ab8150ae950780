//! SQL utilities

pub mod formatter;

pub use formatter::format_sql;
