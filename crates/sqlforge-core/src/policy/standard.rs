//! Standard type policies, parameterized by declaration and literal syntax.

use std::io::{Cursor, Read};
use std::sync::LazyLock;

use chrono::{Duration, NaiveDate, NaiveDateTime};
use regex::Regex;

use super::{invalid_default, quote_literal, TypePolicy, TypePolicyTable};
use crate::binding::{BindContext, ColumnRef, ParameterSink, ResultRow};
use crate::error::{Result, SqlGenError};
use crate::types::{ColumnType, NativeType};
use crate::value::SqlValue;

/// Length used for strings declared without one.
pub const DEFAULT_STRING_LENGTH: u32 = 64;
/// Length used for enumeration codes declared without one.
pub const DEFAULT_ENUM_LENGTH: u32 = 32;
/// Precision used for decimals declared without one.
pub const DEFAULT_DECIMAL_PRECISION: u32 = 18;
/// Scale used for decimals declared without a precision.
pub const DEFAULT_DECIMAL_SCALE: u32 = 2;

const DATE_FORMAT: &str = "%Y-%m-%d";
const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

static DECIMAL_LITERAL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[+-]?(\d+(\.\d*)?|\.\d+)$").expect("decimal literal pattern is valid")
});

fn is_current_keyword(raw: &str, keywords: &[&str]) -> bool {
    keywords.iter().any(|k| raw.eq_ignore_ascii_case(k))
}

// ================================================================
// Character and boolean
// ================================================================

/// `CHAR(1)` single character.
#[derive(Debug, Clone, Copy, Default)]
pub struct CharacterPolicy;

impl TypePolicy for CharacterPolicy {
    fn column_type(&self) -> ColumnType {
        ColumnType::Character
    }

    fn native_type(&self) -> NativeType {
        NativeType::Char
    }

    fn render_type(&self, _length: u32, _precision: u32, _scale: u32) -> String {
        "CHAR(1)".to_string()
    }

    fn render_default(&self, raw: &str) -> Result<String> {
        if raw.chars().count() != 1 {
            return Err(invalid_default(
                ColumnType::Character,
                raw,
                "expected exactly one character",
            ));
        }
        Ok(quote_literal(raw))
    }

    fn alt_default(&self) -> &'static str {
        " "
    }
}

/// How a dialect stores booleans.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BooleanStyle {
    /// Native `BOOLEAN` with `TRUE`/`FALSE` literals.
    Native,
    /// `CHAR(1)` holding `'Y'`/`'N'`.
    YesNo,
    /// `BIT` holding `1`/`0`.
    Bit,
}

/// Boolean storage per [`BooleanStyle`].
#[derive(Debug, Clone, Copy)]
pub struct BooleanPolicy {
    style: BooleanStyle,
}

impl BooleanPolicy {
    /// Creates a boolean policy.
    #[must_use]
    pub const fn new(style: BooleanStyle) -> Self {
        Self { style }
    }

    fn parse(raw: &str) -> Result<bool> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "true" | "t" | "y" | "yes" | "1" => Ok(true),
            "false" | "f" | "n" | "no" | "0" => Ok(false),
            _ => Err(invalid_default(
                ColumnType::Boolean,
                raw,
                "expected true/false, Y/N or 1/0",
            )),
        }
    }

    fn literal(&self, flag: bool) -> &'static str {
        match (self.style, flag) {
            (BooleanStyle::Native, true) => "TRUE",
            (BooleanStyle::Native, false) => "FALSE",
            (BooleanStyle::YesNo, true) => "'Y'",
            (BooleanStyle::YesNo, false) => "'N'",
            (BooleanStyle::Bit, true) => "1",
            (BooleanStyle::Bit, false) => "0",
        }
    }
}

impl TypePolicy for BooleanPolicy {
    fn column_type(&self) -> ColumnType {
        ColumnType::Boolean
    }

    fn native_type(&self) -> NativeType {
        match self.style {
            BooleanStyle::Native => NativeType::Boolean,
            BooleanStyle::YesNo => NativeType::Char,
            BooleanStyle::Bit => NativeType::Bit,
        }
    }

    fn render_type(&self, _length: u32, _precision: u32, _scale: u32) -> String {
        match self.style {
            BooleanStyle::Native => "BOOLEAN",
            BooleanStyle::YesNo => "CHAR(1)",
            BooleanStyle::Bit => "BIT",
        }
        .to_string()
    }

    fn render_default(&self, raw: &str) -> Result<String> {
        Ok(self.literal(Self::parse(raw)?).to_string())
    }

    fn alt_default(&self) -> &'static str {
        "false"
    }

    fn bind(
        &self,
        sink: &mut dyn ParameterSink,
        index: usize,
        value: &SqlValue,
        _ctx: &BindContext,
    ) -> Result<()> {
        if value.is_null() {
            return sink.set_null(index, self.native_type());
        }
        let SqlValue::Bool(flag) = value.clone().coerce(ColumnType::Boolean)? else {
            return Err(SqlGenError::ValueMismatch {
                column_type: ColumnType::Boolean,
                value_kind: value.kind(),
            });
        };
        let bound = match self.style {
            BooleanStyle::YesNo => SqlValue::Char(if flag { 'Y' } else { 'N' }),
            BooleanStyle::Native | BooleanStyle::Bit => SqlValue::Bool(flag),
        };
        sink.set_value(index, &bound)
    }

    fn extract(&self, row: &dyn ResultRow, column: &ColumnRef, _ctx: &BindContext) -> Result<SqlValue> {
        let raw = row.get_value(column, self.native_type())?;
        Ok(match raw {
            SqlValue::Null => SqlValue::Null,
            SqlValue::Bool(b) => SqlValue::Bool(b),
            SqlValue::Char(c) => SqlValue::Bool(c.eq_ignore_ascii_case(&'Y')),
            SqlValue::Text(s) => SqlValue::Bool(s.eq_ignore_ascii_case("Y")),
            SqlValue::Short(n) => SqlValue::Bool(n != 0),
            SqlValue::Int(n) => SqlValue::Bool(n != 0),
            SqlValue::Long(n) => SqlValue::Bool(n != 0),
            other => {
                return Err(SqlGenError::ValueMismatch {
                    column_type: ColumnType::Boolean,
                    value_kind: other.kind(),
                })
            }
        })
    }
}

// ================================================================
// Numbers
// ================================================================

/// `SHORT`, `INTEGER` and `LONG`.
#[derive(Debug, Clone, Copy)]
pub struct IntegerPolicy {
    column_type: ColumnType,
    decl: &'static str,
    native: NativeType,
    digits: Option<u32>,
}

impl IntegerPolicy {
    /// Creates an integral policy declaring `decl`.
    #[must_use]
    pub const fn new(column_type: ColumnType, decl: &'static str, native: NativeType) -> Self {
        Self {
            column_type,
            decl,
            native,
            digits: None,
        }
    }

    /// Compares the reported precision against `digits`, for dialects that
    /// store integers as exact numerics (`NUMBER(10)`).
    #[must_use]
    pub const fn with_digits(mut self, digits: u32) -> Self {
        self.digits = Some(digits);
        self
    }
}

impl TypePolicy for IntegerPolicy {
    fn column_type(&self) -> ColumnType {
        self.column_type
    }

    fn native_type(&self) -> NativeType {
        self.native
    }

    fn render_type(&self, _length: u32, _precision: u32, _scale: u32) -> String {
        self.decl.to_string()
    }

    fn native_dimensions(&self, _length: u32, _precision: u32, _scale: u32) -> Option<(u32, u32)> {
        self.digits.map(|d| (d, 0))
    }

    fn render_default(&self, raw: &str) -> Result<String> {
        let raw = raw.trim();
        let parsed = match self.column_type {
            ColumnType::Short => raw.parse::<i16>().map(i64::from),
            ColumnType::Integer => raw.parse::<i32>().map(i64::from),
            _ => raw.parse::<i64>(),
        };
        parsed
            .map(|n| n.to_string())
            .map_err(|e| invalid_default(self.column_type, raw, e))
    }

    fn alt_default(&self) -> &'static str {
        "0"
    }
}

/// `FLOAT` and `DOUBLE`.
#[derive(Debug, Clone, Copy)]
pub struct FloatingPolicy {
    column_type: ColumnType,
    decl: &'static str,
    native: NativeType,
}

impl FloatingPolicy {
    /// Creates a floating point policy declaring `decl`.
    #[must_use]
    pub const fn new(column_type: ColumnType, decl: &'static str, native: NativeType) -> Self {
        Self {
            column_type,
            decl,
            native,
        }
    }
}

impl TypePolicy for FloatingPolicy {
    fn column_type(&self) -> ColumnType {
        self.column_type
    }

    fn native_type(&self) -> NativeType {
        self.native
    }

    fn render_type(&self, _length: u32, _precision: u32, _scale: u32) -> String {
        self.decl.to_string()
    }

    fn render_default(&self, raw: &str) -> Result<String> {
        let raw = raw.trim();
        let n: f64 = raw
            .parse()
            .map_err(|e| invalid_default(self.column_type, raw, e))?;
        if !n.is_finite() {
            return Err(invalid_default(self.column_type, raw, "not a finite number"));
        }
        Ok(n.to_string())
    }

    fn alt_default(&self) -> &'static str {
        "0"
    }
}

/// Fixed point `DECIMAL(p,s)` (or `NUMBER`/`NUMERIC`).
#[derive(Debug, Clone, Copy)]
pub struct DecimalPolicy {
    keyword: &'static str,
    native: NativeType,
}

impl DecimalPolicy {
    /// Creates a decimal policy declaring `keyword(p,s)`.
    #[must_use]
    pub const fn new(keyword: &'static str, native: NativeType) -> Self {
        Self { keyword, native }
    }

    const fn effective(precision: u32, scale: u32) -> (u32, u32) {
        if precision == 0 {
            (DEFAULT_DECIMAL_PRECISION, DEFAULT_DECIMAL_SCALE)
        } else {
            (precision, scale)
        }
    }
}

impl TypePolicy for DecimalPolicy {
    fn column_type(&self) -> ColumnType {
        ColumnType::Decimal
    }

    fn native_type(&self) -> NativeType {
        self.native
    }

    fn render_type(&self, _length: u32, precision: u32, scale: u32) -> String {
        let (p, s) = Self::effective(precision, scale);
        format!("{}({p},{s})", self.keyword)
    }

    fn native_dimensions(&self, _length: u32, precision: u32, scale: u32) -> Option<(u32, u32)> {
        Some(Self::effective(precision, scale))
    }

    fn render_default(&self, raw: &str) -> Result<String> {
        let raw = raw.trim();
        if DECIMAL_LITERAL.is_match(raw) {
            Ok(raw.to_string())
        } else {
            Err(invalid_default(ColumnType::Decimal, raw, "not a decimal number"))
        }
    }

    fn alt_default(&self) -> &'static str {
        "0"
    }
}

// ================================================================
// Dates and timestamps
// ================================================================

/// Literal syntax for temporal defaults.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TemporalLiteral {
    /// `'2020-01-31 10:15:00'`
    Quoted,
    /// `TO_DATE('2020-01-31', 'YYYY-MM-DD')` and
    /// `TO_TIMESTAMP('2020-01-31 10:15:00', 'YYYY-MM-DD HH24:MI:SS')`
    OracleFunction,
}

/// `DATE`.
#[derive(Debug, Clone, Copy)]
pub struct DatePolicy {
    literal: TemporalLiteral,
}

impl DatePolicy {
    /// Creates a date policy.
    #[must_use]
    pub const fn new(literal: TemporalLiteral) -> Self {
        Self { literal }
    }
}

impl TypePolicy for DatePolicy {
    fn column_type(&self) -> ColumnType {
        ColumnType::Date
    }

    fn native_type(&self) -> NativeType {
        NativeType::Date
    }

    fn render_type(&self, _length: u32, _precision: u32, _scale: u32) -> String {
        "DATE".to_string()
    }

    fn render_default(&self, raw: &str) -> Result<String> {
        let raw = raw.trim();
        if is_current_keyword(raw, &["CURRENT_DATE", "today"]) {
            return Ok("CURRENT_DATE".to_string());
        }
        let date = NaiveDate::parse_from_str(raw, DATE_FORMAT)
            .map_err(|e| invalid_default(ColumnType::Date, raw, e))?;
        let text = date.format(DATE_FORMAT);
        Ok(match self.literal {
            TemporalLiteral::Quoted => format!("'{text}'"),
            TemporalLiteral::OracleFunction => format!("TO_DATE('{text}', 'YYYY-MM-DD')"),
        })
    }

    fn alt_default(&self) -> &'static str {
        "CURRENT_DATE"
    }
}

/// `TIMESTAMP` and `TIMESTAMP_UTC`.
///
/// The UTC variant shifts values by the session offset: local to UTC on
/// bind, UTC to local on extract.
#[derive(Debug, Clone, Copy)]
pub struct TimestampPolicy {
    column_type: ColumnType,
    decl: &'static str,
    literal: TemporalLiteral,
}

impl TimestampPolicy {
    /// Creates a timestamp policy declaring `decl`.
    #[must_use]
    pub const fn new(column_type: ColumnType, decl: &'static str, literal: TemporalLiteral) -> Self {
        Self {
            column_type,
            decl,
            literal,
        }
    }

    fn parse(&self, raw: &str) -> Result<NaiveDateTime> {
        NaiveDateTime::parse_from_str(raw, TIMESTAMP_FORMAT)
            .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S"))
            .or_else(|_| {
                NaiveDate::parse_from_str(raw, DATE_FORMAT).map(|d| d.and_time(chrono::NaiveTime::MIN))
            })
            .map_err(|e| invalid_default(self.column_type, raw, e))
    }

    fn offset(&self, ctx: &BindContext) -> Duration {
        if self.column_type == ColumnType::TimestampUtc {
            Duration::seconds(i64::from(ctx.utc_offset.local_minus_utc()))
        } else {
            Duration::zero()
        }
    }
}

impl TypePolicy for TimestampPolicy {
    fn column_type(&self) -> ColumnType {
        self.column_type
    }

    fn native_type(&self) -> NativeType {
        NativeType::Timestamp
    }

    fn render_type(&self, _length: u32, _precision: u32, _scale: u32) -> String {
        self.decl.to_string()
    }

    fn render_default(&self, raw: &str) -> Result<String> {
        let raw = raw.trim();
        if is_current_keyword(raw, &["CURRENT_TIMESTAMP", "now"]) {
            return Ok("CURRENT_TIMESTAMP".to_string());
        }
        let text = self.parse(raw)?.format(TIMESTAMP_FORMAT);
        Ok(match self.literal {
            TemporalLiteral::Quoted => format!("'{text}'"),
            TemporalLiteral::OracleFunction => {
                format!("TO_TIMESTAMP('{text}', 'YYYY-MM-DD HH24:MI:SS')")
            }
        })
    }

    fn alt_default(&self) -> &'static str {
        "CURRENT_TIMESTAMP"
    }

    fn bind(
        &self,
        sink: &mut dyn ParameterSink,
        index: usize,
        value: &SqlValue,
        ctx: &BindContext,
    ) -> Result<()> {
        match value.clone().coerce(self.column_type)? {
            SqlValue::Null => sink.set_null(index, NativeType::Timestamp),
            SqlValue::Timestamp(ts) => sink.set_value(index, &SqlValue::Timestamp(ts - self.offset(ctx))),
            other => Err(SqlGenError::ValueMismatch {
                column_type: self.column_type,
                value_kind: other.kind(),
            }),
        }
    }

    fn extract(&self, row: &dyn ResultRow, column: &ColumnRef, ctx: &BindContext) -> Result<SqlValue> {
        Ok(match row.get_value(column, NativeType::Timestamp)? {
            SqlValue::Timestamp(ts) => SqlValue::Timestamp(ts + self.offset(ctx)),
            other => other,
        })
    }
}

// ================================================================
// Large objects
// ================================================================

/// How large object values travel to and from the driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LobBinding {
    /// As a plain value.
    Plain,
    /// As a stream.
    Stream,
    /// As a stream; empty values are bound as NULL.
    StreamEmptyAsNull,
}

impl LobBinding {
    const fn streamed(self) -> bool {
        !matches!(self, Self::Plain)
    }
}

/// `CLOB`.
#[derive(Debug, Clone, Copy)]
pub struct ClobPolicy {
    decl: &'static str,
    native: NativeType,
    binding: LobBinding,
    empty_literal: &'static str,
}

impl ClobPolicy {
    /// Creates a CLOB policy. `empty_literal` is the expression for an
    /// empty value, used when backfilling.
    #[must_use]
    pub const fn new(
        decl: &'static str,
        native: NativeType,
        binding: LobBinding,
        empty_literal: &'static str,
    ) -> Self {
        Self {
            decl,
            native,
            binding,
            empty_literal,
        }
    }
}

impl TypePolicy for ClobPolicy {
    fn column_type(&self) -> ColumnType {
        ColumnType::Clob
    }

    fn native_type(&self) -> NativeType {
        self.native
    }

    fn render_type(&self, _length: u32, _precision: u32, _scale: u32) -> String {
        self.decl.to_string()
    }

    fn render_default(&self, raw: &str) -> Result<String> {
        if raw.is_empty() {
            Ok(self.empty_literal.to_string())
        } else {
            Ok(quote_literal(raw))
        }
    }

    fn alt_default(&self) -> &'static str {
        ""
    }

    fn bind(
        &self,
        sink: &mut dyn ParameterSink,
        index: usize,
        value: &SqlValue,
        _ctx: &BindContext,
    ) -> Result<()> {
        match value.clone().coerce(ColumnType::Clob)? {
            SqlValue::Null => sink.set_null(index, self.native),
            SqlValue::Text(s) if s.is_empty() && self.binding == LobBinding::StreamEmptyAsNull => {
                sink.set_null(index, self.native)
            }
            SqlValue::Text(s) if self.binding.streamed() => {
                let length = s.chars().count() as u64;
                sink.set_character_stream(index, &mut Cursor::new(s.into_bytes()), length)
            }
            other => sink.set_value(index, &other),
        }
    }

    fn extract(&self, row: &dyn ResultRow, column: &ColumnRef, _ctx: &BindContext) -> Result<SqlValue> {
        if !self.binding.streamed() {
            return row.get_value(column, self.native);
        }
        match row.get_character_stream(column)? {
            Some(mut stream) => {
                let mut text = String::new();
                stream.read_to_string(&mut text)?;
                Ok(SqlValue::Text(text))
            }
            None => Ok(SqlValue::Null),
        }
    }
}

/// `BLOB`.
#[derive(Debug, Clone, Copy)]
pub struct BlobPolicy {
    decl: &'static str,
    native: NativeType,
    binding: LobBinding,
    empty_literal: &'static str,
}

impl BlobPolicy {
    /// Creates a BLOB policy. `empty_literal` is the expression for an
    /// empty value, used when backfilling.
    #[must_use]
    pub const fn new(
        decl: &'static str,
        native: NativeType,
        binding: LobBinding,
        empty_literal: &'static str,
    ) -> Self {
        Self {
            decl,
            native,
            binding,
            empty_literal,
        }
    }
}

impl TypePolicy for BlobPolicy {
    fn column_type(&self) -> ColumnType {
        ColumnType::Blob
    }

    fn native_type(&self) -> NativeType {
        self.native
    }

    fn render_type(&self, _length: u32, _precision: u32, _scale: u32) -> String {
        self.decl.to_string()
    }

    fn render_default(&self, raw: &str) -> Result<String> {
        if raw.is_empty() {
            Ok(self.empty_literal.to_string())
        } else {
            Err(invalid_default(
                ColumnType::Blob,
                raw,
                "binary columns only take an empty default",
            ))
        }
    }

    fn alt_default(&self) -> &'static str {
        ""
    }

    fn bind(
        &self,
        sink: &mut dyn ParameterSink,
        index: usize,
        value: &SqlValue,
        _ctx: &BindContext,
    ) -> Result<()> {
        match value.clone().coerce(ColumnType::Blob)? {
            SqlValue::Null => sink.set_null(index, self.native),
            SqlValue::Bytes(b) if b.is_empty() && self.binding == LobBinding::StreamEmptyAsNull => {
                sink.set_null(index, self.native)
            }
            SqlValue::Bytes(b) if self.binding.streamed() => {
                let length = b.len() as u64;
                sink.set_byte_stream(index, &mut Cursor::new(b), length)
            }
            other => sink.set_value(index, &other),
        }
    }

    fn extract(&self, row: &dyn ResultRow, column: &ColumnRef, _ctx: &BindContext) -> Result<SqlValue> {
        if !self.binding.streamed() {
            return row.get_value(column, self.native);
        }
        match row.get_byte_stream(column)? {
            Some(mut stream) => {
                let mut bytes = Vec::new();
                stream.read_to_end(&mut bytes)?;
                Ok(SqlValue::Bytes(bytes))
            }
            None => Ok(SqlValue::Null),
        }
    }
}

// ================================================================
// Strings
// ================================================================

/// `STRING` and `ENUMCONST`, stored as variable length text.
#[derive(Debug, Clone, Copy)]
pub struct StringPolicy {
    column_type: ColumnType,
    keyword: &'static str,
    alt_default: &'static str,
}

impl StringPolicy {
    /// Creates a string policy declaring `keyword(n)`.
    #[must_use]
    pub const fn new(column_type: ColumnType, keyword: &'static str) -> Self {
        Self {
            column_type,
            keyword,
            alt_default: "",
        }
    }

    /// Replaces the empty string as backfill value, for engines that store
    /// `''` as NULL.
    #[must_use]
    pub const fn with_alt_default(mut self, alt_default: &'static str) -> Self {
        self.alt_default = alt_default;
        self
    }

    const fn effective_length(&self, length: u32) -> u32 {
        if length > 0 {
            length
        } else if matches!(self.column_type, ColumnType::EnumConstant) {
            DEFAULT_ENUM_LENGTH
        } else {
            DEFAULT_STRING_LENGTH
        }
    }
}

impl TypePolicy for StringPolicy {
    fn column_type(&self) -> ColumnType {
        self.column_type
    }

    fn native_type(&self) -> NativeType {
        NativeType::Varchar
    }

    fn render_type(&self, length: u32, _precision: u32, _scale: u32) -> String {
        format!("{}({})", self.keyword, self.effective_length(length))
    }

    fn native_dimensions(&self, length: u32, _precision: u32, _scale: u32) -> Option<(u32, u32)> {
        Some((self.effective_length(length), 0))
    }

    fn render_default(&self, raw: &str) -> Result<String> {
        Ok(quote_literal(raw))
    }

    fn alt_default(&self) -> &'static str {
        self.alt_default
    }
}

/// The standard policy table: ANSI declarations and quoted literals.
#[must_use]
pub fn standard_policies() -> TypePolicyTable {
    TypePolicyTable::new()
        .with(CharacterPolicy)
        .with(BooleanPolicy::new(BooleanStyle::Native))
        .with(IntegerPolicy::new(ColumnType::Short, "SMALLINT", NativeType::SmallInt))
        .with(IntegerPolicy::new(ColumnType::Integer, "INTEGER", NativeType::Integer))
        .with(IntegerPolicy::new(ColumnType::Long, "BIGINT", NativeType::BigInt))
        .with(FloatingPolicy::new(ColumnType::Float, "FLOAT", NativeType::Float))
        .with(FloatingPolicy::new(ColumnType::Double, "DOUBLE", NativeType::Double))
        .with(DecimalPolicy::new("DECIMAL", NativeType::Decimal))
        .with(DatePolicy::new(TemporalLiteral::Quoted))
        .with(TimestampPolicy::new(
            ColumnType::Timestamp,
            "TIMESTAMP",
            TemporalLiteral::Quoted,
        ))
        .with(TimestampPolicy::new(
            ColumnType::TimestampUtc,
            "TIMESTAMP",
            TemporalLiteral::Quoted,
        ))
        .with(ClobPolicy::new(
            "CLOB",
            NativeType::Clob,
            LobBinding::Plain,
            "CAST('' AS CLOB)",
        ))
        .with(BlobPolicy::new(
            "BLOB",
            NativeType::Blob,
            LobBinding::Plain,
            "CAST(X'' AS BLOB)",
        ))
        .with(StringPolicy::new(ColumnType::String, "VARCHAR"))
        .with(StringPolicy::new(ColumnType::EnumConstant, "VARCHAR"))
}
