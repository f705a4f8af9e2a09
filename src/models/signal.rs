use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

// ---------------------------------------------------------------------------
// Action
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    Buy,
    Sell,
}

impl Action {
    /// Exact, case-sensitive match on `buy` / `sell`.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "buy" => Some(Action::Buy),
            "sell" => Some(Action::Sell),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Action::Buy => "buy",
            Action::Sell => "sell",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// RowKey
// ---------------------------------------------------------------------------

/// Per-partition ordering key: epoch milliseconds at ingestion.
///
/// Rendered as an unpadded decimal string but always compared as a number,
/// so `999 < 1000` holds even though `"999" > "1000"` lexically.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RowKey(u64);

impl RowKey {
    pub const fn from_millis(millis: u64) -> Self {
        Self(millis)
    }

    /// Epoch milliseconds of `at`; instants before the epoch clamp to zero.
    pub fn from_datetime(at: DateTime<Utc>) -> Self {
        Self(u64::try_from(at.timestamp_millis()).unwrap_or(0))
    }

    pub const fn millis(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for RowKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, thiserror::Error)]
#[error("invalid row key: {0:?}")]
pub struct InvalidRowKey(pub String);

impl FromStr for RowKey {
    type Err = InvalidRowKey;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse::<u64>()
            .map(RowKey)
            .map_err(|_| InvalidRowKey(s.to_string()))
    }
}

impl Serialize for RowKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for RowKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

// ---------------------------------------------------------------------------
// SignalPayload: raw ingestion input
// ---------------------------------------------------------------------------

/// Ingestion body as received, before validation.
///
/// Every field is optional or loosely typed so that the validator can report
/// all violations at once instead of failing on the first missing field.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SignalPayload {
    pub ticker: Option<String>,
    pub action: Option<String>,
    pub close: Option<Decimal>,
    pub contracts: Option<i64>,
    pub notes: Option<String>,
}

// ---------------------------------------------------------------------------
// Signal
// ---------------------------------------------------------------------------

/// A validated trading signal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Signal {
    pub ticker: String,
    pub action: Action,
    pub close: Decimal,
    pub contracts: u32,
    /// Empty when the sender supplied no notes.
    #[serde(default)]
    pub notes: String,
}

impl Signal {
    /// Copy of this signal with `timestamp=<row_key>` appended to the notes.
    pub fn annotated(&self, row_key: RowKey) -> Self {
        let marker = format!("timestamp={row_key}");
        let notes = if self.notes.is_empty() {
            marker
        } else {
            format!("{}; {marker}", self.notes)
        };
        Self {
            notes,
            ..self.clone()
        }
    }
}

// ---------------------------------------------------------------------------
// StoredSignal: a keyed entity in the table
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredSignal {
    pub partition_key: String,
    pub row_key: RowKey,
    #[serde(flatten)]
    pub signal: Signal,
}

impl fmt::Display for StoredSignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Signal: {}/{} action={} close={} contracts={}",
            self.partition_key,
            self.row_key,
            self.signal.action,
            self.signal.close,
            self.signal.contracts,
        )
    }
}

/// Row-key predicate pushed down to the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowKeyFilter {
    AtOrBefore(RowKey),
}

impl RowKeyFilter {
    pub fn matches(&self, row_key: RowKey) -> bool {
        match *self {
            RowKeyFilter::AtOrBefore(cutoff) => row_key <= cutoff,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn signal(notes: &str) -> Signal {
        Signal {
            ticker: "ACME".into(),
            action: Action::Buy,
            close: Decimal::new(1250, 2),
            contracts: 10,
            notes: notes.into(),
        }
    }

    #[test]
    fn test_action_is_case_sensitive() {
        assert_eq!(Action::parse("buy"), Some(Action::Buy));
        assert_eq!(Action::parse("sell"), Some(Action::Sell));
        assert_eq!(Action::parse("BUY"), None);
        assert_eq!(Action::parse("Sell"), None);
        assert_eq!(Action::parse(""), None);
    }

    #[test]
    fn test_row_key_orders_numerically_across_digit_widths() {
        let short: RowKey = "999".parse().unwrap();
        let long: RowKey = "1000".parse().unwrap();
        assert!("999" > "1000", "lexical order is the bug being guarded");
        assert!(short < long);

        let mut keys: Vec<RowKey> = ["9999999999999", "100", "20", "200"]
            .iter()
            .map(|s| s.parse().unwrap())
            .collect();
        keys.sort();
        let rendered: Vec<String> = keys.iter().map(|k| k.to_string()).collect();
        assert_eq!(rendered, vec!["20", "100", "200", "9999999999999"]);
    }

    #[test]
    fn test_row_key_rejects_non_numeric() {
        assert!("12a".parse::<RowKey>().is_err());
        assert!("".parse::<RowKey>().is_err());
        assert!("-5".parse::<RowKey>().is_err());
    }

    #[test]
    fn test_row_key_serializes_as_string() {
        let json = serde_json::to_value(RowKey::from_millis(1_700_000_000_000)).unwrap();
        assert_eq!(json, serde_json::json!("1700000000000"));
        let back: RowKey = serde_json::from_value(json).unwrap();
        assert_eq!(back.millis(), 1_700_000_000_000);
    }

    #[test]
    fn test_annotation_without_notes() {
        let annotated = signal("").annotated(RowKey::from_millis(42));
        assert_eq!(annotated.notes, "timestamp=42");
    }

    #[test]
    fn test_annotation_appends_to_existing_notes() {
        let original = signal("breakout");
        let annotated = original.annotated(RowKey::from_millis(42));
        assert_eq!(annotated.notes, "breakout; timestamp=42");
        assert_eq!(original.notes, "breakout");
    }

    #[test]
    fn test_row_key_filter() {
        let cutoff = RowKey::from_millis(500);
        assert!(RowKeyFilter::AtOrBefore(cutoff).matches(RowKey::from_millis(500)));
        assert!(!RowKeyFilter::AtOrBefore(cutoff).matches(RowKey::from_millis(501)));
    }

    #[test]
    fn test_stored_signal_json_shape() {
        let stored = StoredSignal {
            partition_key: "ACME".into(),
            row_key: RowKey::from_millis(7),
            signal: signal(""),
        };
        let json = serde_json::to_value(&stored).unwrap();
        assert_eq!(json["partition_key"], "ACME");
        assert_eq!(json["row_key"], "7");
        assert_eq!(json["action"], "buy");
        assert_eq!(json["contracts"], 10);
        assert_eq!(json["close"], "12.50");
    }
}
