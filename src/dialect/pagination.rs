//! Pagination clause strategies.
//!
//! A paginator receives a complete `SELECT` and returns it limited to
//! `limit` rows after skipping `offset` rows. Callers only invoke it when
//! `limit > 0`.

use std::fmt;

/// Applies row limiting to a compiled `SELECT`
pub trait Paginator: Send + Sync + fmt::Debug {
    fn paginate(&self, sql: &str, limit: u64, offset: u64) -> String;
}

/// `LIMIT n OFFSET m` (MySQL, MariaDB, Postgres, SQLite and the generic base)
#[derive(Debug, Clone, Copy, Default)]
pub struct LimitOffset;

impl Paginator for LimitOffset {
    fn paginate(&self, sql: &str, limit: u64, offset: u64) -> String {
        format!("{} LIMIT {} OFFSET {}", sql, limit, offset)
    }
}

/// Oracle: double `ROWNUM` wrap
///
/// `ROWNUM` is assigned before `ORDER BY` is applied, so the ordered query
/// is wrapped once to number its rows and again to cut the lower bound.
#[derive(Debug, Clone, Copy, Default)]
pub struct RownumWrap;

impl Paginator for RownumWrap {
    fn paginate(&self, sql: &str, limit: u64, offset: u64) -> String {
        format!(
            "SELECT * FROM (SELECT paged_.*, ROWNUM AS rownum_ FROM ({}) paged_ WHERE ROWNUM <= {}) WHERE rownum_ > {}",
            sql,
            offset.saturating_add(limit),
            offset
        )
    }
}

/// SQL Server: `OFFSET m ROWS FETCH NEXT n ROWS ONLY`
///
/// `OFFSET` is only legal after `ORDER BY`; when the statement has none,
/// `ORDER BY (SELECT NULL)` is synthesized.
#[derive(Debug, Clone, Copy, Default)]
pub struct OffsetFetch;

impl Paginator for OffsetFetch {
    fn paginate(&self, sql: &str, limit: u64, offset: u64) -> String {
        let mut out = sql.to_string();
        if !has_top_level_order_by(sql) {
            out.push_str(" ORDER BY (SELECT NULL)");
        }
        out.push_str(&format!(" OFFSET {} ROWS FETCH NEXT {} ROWS ONLY", offset, limit));
        out
    }
}

/// `true` if `ORDER BY` appears outside parentheses and quotes
pub(crate) fn has_top_level_order_by(sql: &str) -> bool {
    let upper = sql.to_uppercase();
    let bytes = upper.as_bytes();
    let mut depth: i32 = 0;
    let mut quote: Option<u8> = None;
    let mut i = 0;
    while i < bytes.len() {
        let b = bytes[i];
        match quote {
            Some(q) => {
                if b == q {
                    quote = None;
                }
            }
            None => match b {
                b'\'' | b'"' => quote = Some(b),
                b'[' => quote = Some(b']'),
                b'(' => depth += 1,
                b')' => depth -= 1,
                b'O' if depth == 0 && upper[i..].starts_with("ORDER BY") => {
                    let boundary_before =
                        i == 0 || (!bytes[i - 1].is_ascii_alphanumeric() && bytes[i - 1] != b'_');
                    if boundary_before {
                        return true;
                    }
                }
                _ => {}
            },
        }
        i += 1;
    }
    false
}
