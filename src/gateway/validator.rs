//! Read-only statement validation
//!
//! A syntactic allow/deny list over the leading keyword of a statement.
//! It is not a parser: nothing after the first keyword is inspected.

use serde::Serialize;
use std::fmt;

/// Leading verbs that modify data or schema
const WRITE_VERBS: &[&str] = &[
    "insert", "update", "delete", "drop", "create", "alter", "truncate", "grant", "revoke",
    "merge",
];

/// Leading verbs allowed through to the engine
const READ_VERBS: &[&str] = &["select", "with", "show", "describe", "explain"];

/// Why a statement was refused
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Rejection {
    /// Statement starts with a write/DDL verb
    WriteOperation,
    /// Statement starts with something other than a permitted read verb
    NotPermitted,
}

impl Rejection {
    pub fn reason(&self) -> &'static str {
        match self {
            Rejection::WriteOperation => "write operation forbidden",
            Rejection::NotPermitted => "statement type not permitted",
        }
    }
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.reason())
    }
}

impl std::error::Error for Rejection {}

/// Classify `sql` as permitted or rejected.
///
/// Write verbs are checked first, so `DROP TABLE x; SELECT 1` is a write.
pub fn validate(sql: &str) -> Result<(), Rejection> {
    let keyword = leading_keyword(sql).to_ascii_lowercase();

    if WRITE_VERBS.contains(&keyword.as_str()) {
        return Err(Rejection::WriteOperation);
    }
    if !READ_VERBS.contains(&keyword.as_str()) {
        return Err(Rejection::NotPermitted);
    }
    Ok(())
}

/// First run of identifier characters after leading whitespace
fn leading_keyword(sql: &str) -> &str {
    let trimmed = sql.trim_start();
    let end = trimmed
        .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
        .unwrap_or(trimmed.len());
    &trimmed[..end]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_verbs_accepted() {
        for sql in [
            "SELECT 1",
            "  select * from t",
            "\n\tWITH x AS (SELECT 1) SELECT * FROM x",
            "show tables",
            "DESCRIBE orders",
            "Explain select 1",
            "select\n*\nfrom t",
        ] {
            assert_eq!(validate(sql), Ok(()), "expected {:?} to pass", sql);
        }
    }

    #[test]
    fn test_write_verbs_rejected_regardless_of_tail() {
        for sql in [
            "INSERT INTO t VALUES (1)",
            "update t set a = 1",
            "  Delete from t",
            "DROP TABLE x; SELECT 1",
            "create table t (a int)",
            "ALTER TABLE t ADD b int",
            "truncate t",
            "GRANT ALL ON t TO bob",
            "revoke all on t from bob",
            "MERGE INTO t USING s ON true WHEN MATCHED THEN DELETE",
        ] {
            assert_eq!(
                validate(sql),
                Err(Rejection::WriteOperation),
                "expected {:?} to be a write",
                sql
            );
        }
    }

    #[test]
    fn test_other_statements_not_permitted() {
        for sql in ["", "   ", "CALL proc()", "(SELECT 1)", "selectx from t", "VACUUM"] {
            assert_eq!(
                validate(sql),
                Err(Rejection::NotPermitted),
                "expected {:?} to be refused",
                sql
            );
        }
    }

    #[test]
    fn test_only_first_keyword_is_inspected() {
        // Known limitation: writes hidden after a read verb pass validation
        assert_eq!(validate("SELECT 1; DROP TABLE x"), Ok(()));
        assert_eq!(validate("WITH gone AS (DELETE FROM t RETURNING *) SELECT 1"), Ok(()));
    }

    #[test]
    fn test_rejection_reasons() {
        assert_eq!(
            Rejection::WriteOperation.to_string(),
            "write operation forbidden"
        );
        assert_eq!(
            Rejection::NotPermitted.to_string(),
            "statement type not permitted"
        );
    }
}
