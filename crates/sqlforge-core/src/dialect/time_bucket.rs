//! Date/time bucketing expressions for aggregation queries.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Granularity of a time bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TimeBucket {
    Hour,
    Day,
    DayOfWeek,
    DayOfMonth,
    DayOfYear,
    Week,
    Month,
    Year,
}

impl TimeBucket {
    /// Every bucket.
    pub const ALL: [Self; 8] = [
        Self::Hour,
        Self::Day,
        Self::DayOfWeek,
        Self::DayOfMonth,
        Self::DayOfYear,
        Self::Week,
        Self::Month,
        Self::Year,
    ];
}

impl fmt::Display for TimeBucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Hour => "HOUR",
            Self::Day => "DAY",
            Self::DayOfWeek => "DAY_OF_WEEK",
            Self::DayOfMonth => "DAY_OF_MONTH",
            Self::DayOfYear => "DAY_OF_YEAR",
            Self::Week => "WEEK",
            Self::Month => "MONTH",
            Self::Year => "YEAR",
        };
        f.write_str(s)
    }
}

/// A bucket rendered for one field: the grouping expression and a
/// human-readable label expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimeBucketExpr {
    /// Expression to group and order by.
    pub truncated: String,
    /// Expression producing the bucket label.
    pub label: String,
}

/// Dialect rule for time bucket expressions.
///
/// `None` means the dialect cannot express the bucket.
pub trait TimeBucketRenderer: fmt::Debug + Send + Sync {
    /// Grouping expression over `field`.
    fn truncate(&self, field: &str, bucket: TimeBucket) -> Option<String>;

    /// Label expression over `field`.
    fn label(&self, field: &str, bucket: TimeBucket) -> Option<String>;
}

/// `TRUNC(...)` and `TO_CHAR(...)`, shared by HSQLDB and Oracle.
#[derive(Debug, Clone, Copy, Default)]
pub struct TruncToCharBuckets;

impl TimeBucketRenderer for TruncToCharBuckets {
    fn truncate(&self, field: &str, bucket: TimeBucket) -> Option<String> {
        Some(match bucket {
            TimeBucket::Hour => format!("TRUNC({field}, 'HH24')"),
            TimeBucket::Day => format!("TRUNC({field}, 'DD')"),
            TimeBucket::Week => format!("TRUNC({field}, 'IW')"),
            TimeBucket::Month => format!("TRUNC({field}, 'MM')"),
            TimeBucket::Year => format!("TRUNC({field}, 'YYYY')"),
            TimeBucket::DayOfWeek => format!("TO_CHAR({field}, 'D')"),
            TimeBucket::DayOfMonth => format!("TO_CHAR({field}, 'DD')"),
            TimeBucket::DayOfYear => format!("TO_CHAR({field}, 'DDD')"),
        })
    }

    fn label(&self, field: &str, bucket: TimeBucket) -> Option<String> {
        let pattern = match bucket {
            TimeBucket::Hour => "YYYY-MM-DD HH24",
            TimeBucket::Day => "YYYY-MM-DD",
            TimeBucket::Week => "IYYY-IW",
            TimeBucket::Month => "YYYY-MM",
            TimeBucket::Year => "YYYY",
            TimeBucket::DayOfWeek => "DY",
            TimeBucket::DayOfMonth => "DD",
            TimeBucket::DayOfYear => "DDD",
        };
        Some(format!("TO_CHAR({field}, '{pattern}')"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trunc_to_char_covers_every_bucket() {
        for bucket in TimeBucket::ALL {
            assert!(TruncToCharBuckets.truncate("T.CREATED_ON", bucket).is_some());
            assert!(TruncToCharBuckets.label("T.CREATED_ON", bucket).is_some());
        }
    }

    #[test]
    fn test_trunc_week() {
        assert_eq!(
            TruncToCharBuckets.truncate("CREATED_ON", TimeBucket::Week),
            Some("TRUNC(CREATED_ON, 'IW')".to_string())
        );
        assert_eq!(
            TruncToCharBuckets.label("CREATED_ON", TimeBucket::Month),
            Some("TO_CHAR(CREATED_ON, 'YYYY-MM')".to_string())
        );
    }
}
