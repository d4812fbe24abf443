//! Comparison of default expressions read back from a database with
//! configured defaults.
//!
//! Databases rarely report a default the way it was written: PostgreSQL
//! appends casts, SQL Server wraps expressions in parentheses, MySQL strips
//! quotes. Each [`DefaultMatcher`] undoes its dialect's decoration so that
//! an unchanged default is never reported as altered.

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;

use crate::policy::TypePolicy;

/// Keyword spellings that denote the same default.
const SYNONYMS: &[(&str, &str)] = &[
    ("NOW()", "CURRENT_TIMESTAMP"),
    ("CURRENT_TIMESTAMP()", "CURRENT_TIMESTAMP"),
    ("LOCALTIMESTAMP", "CURRENT_TIMESTAMP"),
    ("SYSTIMESTAMP", "CURRENT_TIMESTAMP"),
    ("SYSDATE", "CURRENT_TIMESTAMP"),
    ("GETDATE()", "CURRENT_TIMESTAMP"),
    ("SYSDATETIME()", "CURRENT_TIMESTAMP"),
    ("CURDATE()", "CURRENT_DATE"),
    ("CURRENT_DATE()", "CURRENT_DATE"),
    ("CONVERT([DATE],GETDATE())", "CURRENT_DATE"),
];

static CAST_SUFFIX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"::[A-Za-z_][A-Za-z0-9_ ]*(\([0-9, ]*\))?(\[\])?").expect("cast pattern is valid")
});

static NUMBER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[+-]?\d+(\.\d+)?$").expect("number pattern is valid"));

/// Upper-cases and removes whitespace outside single-quoted segments.
#[must_use]
pub fn fold_unquoted(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut quoted = false;
    for c in s.chars() {
        if c == '\'' {
            quoted = !quoted;
            out.push(c);
        } else if quoted {
            out.push(c);
        } else if !c.is_whitespace() {
            out.push(c.to_ascii_uppercase());
        }
    }
    out
}

/// Maps keyword synonyms onto their canonical spelling.
fn canonical(folded: String) -> String {
    SYNONYMS
        .iter()
        .find(|(alias, _)| folded.eq_ignore_ascii_case(alias))
        .map_or(folded, |(_, canon)| (*canon).to_string())
}

/// Removes parentheses enclosing the whole expression, repeatedly.
fn strip_outer_parens(s: &str) -> &str {
    let mut s = s.trim();
    while s.starts_with('(') && s.ends_with(')') && encloses_all(s) {
        s = s[1..s.len() - 1].trim();
    }
    s
}

/// Returns `true` if the opening parenthesis at 0 closes at the last char.
fn encloses_all(s: &str) -> bool {
    let mut depth = 0usize;
    let mut quoted = false;
    let last = s.len() - 1;
    for (i, c) in s.char_indices() {
        match c {
            '\'' => quoted = !quoted,
            '(' if !quoted => depth += 1,
            ')' if !quoted => {
                depth = depth.saturating_sub(1);
                if depth == 0 && i != last {
                    return false;
                }
            }
            _ => {}
        }
    }
    depth == 0
}

fn unquote(s: &str) -> Option<String> {
    let inner = s.strip_prefix('\'')?.strip_suffix('\'')?;
    Some(inner.replace("''", "'"))
}

/// Dialect rule for normalizing and comparing default expressions.
pub trait DefaultMatcher: fmt::Debug + Send + Sync {
    /// Canonical form of a default expression. Empty means "no default".
    fn normalize(&self, literal: &str) -> String;

    /// Returns `true` if the default read back from the database (`native`)
    /// is equivalent to the configured raw default.
    ///
    /// The configured default is first rendered by `policy` so that both
    /// sides are compared in the same literal syntax.
    fn matches(&self, native: Option<&str>, configured: Option<&str>, policy: &dyn TypePolicy) -> bool {
        let native = native
            .map(|n| self.normalize(n))
            .filter(|n| !n.is_empty() && !n.eq_ignore_ascii_case("NULL"));
        let configured = configured.filter(|c| !c.trim().is_empty());
        match (native, configured) {
            (None, None) => true,
            (Some(_), None) | (None, Some(_)) => false,
            (Some(native), Some(raw)) => policy
                .render_default(raw)
                .is_ok_and(|rendered| self.normalize(&rendered) == native),
        }
    }
}

/// Defaults reported verbatim (HSQLDB, Oracle).
#[derive(Debug, Clone, Copy, Default)]
pub struct QuotedDefaults;

impl DefaultMatcher for QuotedDefaults {
    fn normalize(&self, literal: &str) -> String {
        canonical(fold_unquoted(literal.trim()))
    }
}

/// Defaults reported with a `::type` cast suffix (PostgreSQL).
///
/// A numeric literal quoted only to carry a cast (`'0'::numeric`) is
/// unquoted.
#[derive(Debug, Clone, Copy, Default)]
pub struct CastSuffixDefaults;

impl DefaultMatcher for CastSuffixDefaults {
    fn normalize(&self, literal: &str) -> String {
        let stripped = CAST_SUFFIX.replace_all(literal.trim(), "");
        let had_cast = stripped.len() != literal.trim().len();
        let bare = strip_outer_parens(&stripped);
        if had_cast {
            if let Some(inner) = unquote(bare).filter(|i| NUMBER.is_match(i)) {
                return inner;
            }
        }
        canonical(fold_unquoted(bare))
    }
}

/// Defaults reported without quotes (MySQL).
///
/// Both sides are unquoted; booleans compare as `1`/`0`.
#[derive(Debug, Clone, Copy, Default)]
pub struct BareDefaults;

impl DefaultMatcher for BareDefaults {
    fn normalize(&self, literal: &str) -> String {
        let trimmed = literal.trim();
        if let Some(inner) = unquote(trimmed) {
            return inner;
        }
        let canon = canonical(trimmed.to_string());
        if canon.eq_ignore_ascii_case("TRUE") {
            "1".to_string()
        } else if canon.eq_ignore_ascii_case("FALSE") {
            "0".to_string()
        } else if canon.eq_ignore_ascii_case("CURRENT_TIMESTAMP")
            || canon.eq_ignore_ascii_case("CURRENT_DATE")
        {
            canon.to_ascii_uppercase()
        } else {
            canon
        }
    }
}

/// Defaults reported inside parentheses, with `N` string prefixes
/// (SQL Server).
#[derive(Debug, Clone, Copy, Default)]
pub struct ParenthesizedDefaults;

impl DefaultMatcher for ParenthesizedDefaults {
    fn normalize(&self, literal: &str) -> String {
        let bare = strip_outer_parens(literal);
        let bare = bare
            .strip_prefix('N')
            .filter(|rest| rest.starts_with('\''))
            .unwrap_or(bare);
        canonical(fold_unquoted(bare))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::standard::{
        BooleanPolicy, BooleanStyle, DecimalPolicy, IntegerPolicy, StringPolicy, TimestampPolicy,
        TemporalLiteral,
    };
    use crate::types::{ColumnType, NativeType};

    fn int() -> IntegerPolicy {
        IntegerPolicy::new(ColumnType::Integer, "INTEGER", NativeType::Integer)
    }

    fn string() -> StringPolicy {
        StringPolicy::new(ColumnType::String, "VARCHAR")
    }

    #[test]
    fn test_fold_unquoted_keeps_string_content() {
        assert_eq!(
            fold_unquoted("to_date('2020-01-31',  'yyyy-mm-dd')"),
            "TO_DATE('2020-01-31','yyyy-mm-dd')"
        );
    }

    #[test]
    fn test_strip_outer_parens() {
        assert_eq!(strip_outer_parens("((0))"), "0");
        assert_eq!(strip_outer_parens("(a) + (b)"), "(a) + (b)");
        assert_eq!(strip_outer_parens("(')(')"), "')('");
    }

    #[test]
    fn test_absent_defaults() {
        let m = QuotedDefaults;
        assert!(m.matches(None, None, &int()));
        assert!(m.matches(Some("NULL"), None, &int()));
        assert!(!m.matches(Some("0"), None, &int()));
        assert!(!m.matches(None, Some("0"), &int()));
    }

    #[test]
    fn test_quoted_synonyms() {
        let p = TimestampPolicy::new(ColumnType::Timestamp, "TIMESTAMP", TemporalLiteral::Quoted);
        assert!(QuotedDefaults.matches(Some("SYSDATE "), Some("now"), &p));
        assert!(QuotedDefaults.matches(Some("current_timestamp"), Some("now"), &p));
    }

    #[test]
    fn test_postgres_cast_suffix() {
        let m = CastSuffixDefaults;
        assert!(m.matches(Some("'abc'::character varying"), Some("abc"), &string()));
        assert!(!m.matches(Some("'abd'::character varying"), Some("abc"), &string()));
        let dec = DecimalPolicy::new("DECIMAL", NativeType::Decimal);
        assert!(m.matches(Some("'12.50'::numeric"), Some("12.50"), &dec));
        assert!(m.matches(Some("(-1)"), Some("-1"), &int()));
        let yn = BooleanPolicy::new(BooleanStyle::YesNo);
        assert!(m.matches(Some("'Y'::bpchar"), Some("true"), &yn));
    }

    #[test]
    fn test_mysql_bare() {
        let m = BareDefaults;
        assert!(m.matches(Some("abc"), Some("abc"), &string()));
        assert!(m.matches(Some("0"), Some("0"), &int()));
        let b = BooleanPolicy::new(BooleanStyle::Native);
        assert!(m.matches(Some("1"), Some("true"), &b));
        assert!(!m.matches(Some("0"), Some("true"), &b));
    }

    #[test]
    fn test_mssql_parenthesized() {
        let m = ParenthesizedDefaults;
        assert!(m.matches(Some("((0))"), Some("0"), &int()));
        assert!(m.matches(Some("(N'abc')"), Some("abc"), &string()));
        let p = TimestampPolicy::new(ColumnType::Timestamp, "DATETIME", TemporalLiteral::Quoted);
        assert!(m.matches(Some("(getdate())"), Some("now"), &p));
        let bit = BooleanPolicy::new(BooleanStyle::Bit);
        assert!(m.matches(Some("((1))"), Some("Y"), &bit));
    }

    #[test]
    fn test_unrenderable_configured_default_never_matches() {
        assert!(!QuotedDefaults.matches(Some("0"), Some("zero"), &int()));
    }
}
