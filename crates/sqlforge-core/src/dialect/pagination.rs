//! Result window (offset/limit) rendering.
//!
//! A SELECT is built in three stages and the dialect's strategy gets a
//! chance to add its window at each: right after `SELECT`, at the end of
//! the WHERE clause, and after ORDER BY. The first stage that reports
//! `true` owns the window; later stages are skipped.

use std::fmt;

use crate::error::{Result, SqlGenError};

/// Dialect rule for expressing a result window.
pub trait PaginationStrategy: fmt::Debug + Send + Sync {
    /// Appends after `SELECT [DISTINCT] `.
    fn append_infix(&self, _sql: &mut String, _offset: u32, _limit: u32) -> Result<bool> {
        Ok(false)
    }

    /// Appends at the end of the WHERE clause. `has_where` tells whether a
    /// WHERE keyword has already been written.
    fn append_where_suffix(
        &self,
        _sql: &mut String,
        _offset: u32,
        _limit: u32,
        _has_where: bool,
    ) -> Result<bool> {
        Ok(false)
    }

    /// Appends at the very end of the statement.
    fn append_trailing_suffix(&self, _sql: &mut String, _offset: u32, _limit: u32) -> Result<bool> {
        Ok(false)
    }
}

/// Trailing `LIMIT n OFFSET m`.
#[derive(Debug, Clone, Copy, Default)]
pub struct LimitOffset {
    limit_required: bool,
}

impl LimitOffset {
    /// Creates the strategy.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            limit_required: false,
        }
    }

    /// For dialects that reject OFFSET without LIMIT: an unbounded limit is
    /// written when only an offset is requested.
    #[must_use]
    pub const fn limit_required(mut self) -> Self {
        self.limit_required = true;
        self
    }
}

impl PaginationStrategy for LimitOffset {
    fn append_trailing_suffix(&self, sql: &mut String, offset: u32, limit: u32) -> Result<bool> {
        if limit > 0 {
            sql.push_str(&format!(" LIMIT {limit}"));
        } else if offset > 0 && self.limit_required {
            sql.push_str(&format!(" LIMIT {}", u64::MAX));
        }
        if offset > 0 {
            sql.push_str(&format!(" OFFSET {offset}"));
        }
        Ok(limit > 0 || offset > 0)
    }
}

/// Trailing `OFFSET m ROWS FETCH NEXT n ROWS ONLY`.
#[derive(Debug, Clone, Copy, Default)]
pub struct OffsetFetch;

impl PaginationStrategy for OffsetFetch {
    fn append_trailing_suffix(&self, sql: &mut String, offset: u32, limit: u32) -> Result<bool> {
        if offset > 0 {
            sql.push_str(&format!(" OFFSET {offset} ROWS"));
        }
        if limit > 0 {
            sql.push_str(&format!(" FETCH NEXT {limit} ROWS ONLY"));
        }
        Ok(limit > 0 || offset > 0)
    }
}

/// `SELECT TOP n ...`. Offsets cannot be expressed.
#[derive(Debug, Clone)]
pub struct TopInfix {
    dialect: &'static str,
}

impl TopInfix {
    /// Creates the strategy for the named dialect.
    #[must_use]
    pub const fn new(dialect: &'static str) -> Self {
        Self { dialect }
    }
}

impl PaginationStrategy for TopInfix {
    fn append_infix(&self, sql: &mut String, offset: u32, limit: u32) -> Result<bool> {
        if offset > 0 {
            return Err(SqlGenError::OffsetNotSupported {
                dialect: self.dialect.to_string(),
                offset,
            });
        }
        if limit == 0 {
            return Ok(false);
        }
        sql.push_str(&format!("TOP {limit} "));
        Ok(true)
    }
}

/// `ROWNUM <= n` folded into the WHERE clause. Offsets cannot be expressed.
#[derive(Debug, Clone)]
pub struct RowNumFilter {
    dialect: &'static str,
}

impl RowNumFilter {
    /// Creates the strategy for the named dialect.
    #[must_use]
    pub const fn new(dialect: &'static str) -> Self {
        Self { dialect }
    }
}

impl PaginationStrategy for RowNumFilter {
    fn append_where_suffix(
        &self,
        sql: &mut String,
        offset: u32,
        limit: u32,
        has_where: bool,
    ) -> Result<bool> {
        if offset > 0 {
            return Err(SqlGenError::OffsetNotSupported {
                dialect: self.dialect.to_string(),
                offset,
            });
        }
        if limit == 0 {
            return Ok(false);
        }
        let keyword = if has_where { "AND" } else { "WHERE" };
        sql.push_str(&format!(" {keyword} ROWNUM <= {limit}"));
        Ok(true)
    }
}
