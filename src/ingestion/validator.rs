use rust_decimal::Decimal;
use serde::Serialize;

use crate::models::{Action, Signal, SignalPayload};

pub const MAX_TICKER_LEN: usize = 50;
pub const MAX_NOTES_LEN: usize = 500;
pub const MIN_CONTRACTS: i64 = 1;
pub const MAX_CONTRACTS: i64 = 99_999;

/// Upper bound for `close`: 9999999.99.
pub const MAX_CLOSE: Decimal = Decimal::from_parts(999_999_999, 0, 0, false, 2);

/// A single failed field constraint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Violation {
    pub field: &'static str,
    pub message: String,
}

impl Violation {
    fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationResult {
    pub violations: Vec<Violation>,
}

impl ValidationResult {
    pub fn is_ok(&self) -> bool {
        self.violations.is_empty()
    }
}

/// Check every field constraint on `payload`, collecting all failures.
pub fn validate(payload: &SignalPayload) -> ValidationResult {
    let mut violations = Vec::new();

    match payload.ticker.as_deref() {
        None => violations.push(Violation::new("ticker", "ticker is required")),
        Some(ticker) => {
            let ticker_len = ticker.chars().count();
            if ticker_len == 0 {
                violations.push(Violation::new("ticker", "ticker must not be empty"));
            } else if ticker_len > MAX_TICKER_LEN {
                violations.push(Violation::new(
                    "ticker",
                    format!("ticker must be at most {MAX_TICKER_LEN} characters, got {ticker_len}"),
                ));
            }
        }
    }

    match payload.action.as_deref() {
        None => violations.push(Violation::new("action", "action is required")),
        Some(action) if Action::parse(action).is_none() => {
            violations.push(Violation::new(
                "action",
                "action must be either 'buy' or 'sell'",
            ));
        }
        Some(_) => {}
    }

    match payload.close {
        None => violations.push(Violation::new("close", "close is required")),
        Some(close) if close < Decimal::ZERO || close > MAX_CLOSE => {
            violations.push(Violation::new(
                "close",
                format!("close must be between 0 and {MAX_CLOSE}, got {close}"),
            ));
        }
        Some(_) => {}
    }

    match payload.contracts {
        None => violations.push(Violation::new("contracts", "contracts is required")),
        Some(n) if !(MIN_CONTRACTS..=MAX_CONTRACTS).contains(&n) => {
            violations.push(Violation::new(
                "contracts",
                format!("contracts must be between {MIN_CONTRACTS} and {MAX_CONTRACTS}, got {n}"),
            ));
        }
        Some(_) => {}
    }

    if let Some(notes) = &payload.notes {
        let notes_len = notes.chars().count();
        if notes_len > MAX_NOTES_LEN {
            violations.push(Violation::new(
                "notes",
                format!("notes must be at most {MAX_NOTES_LEN} characters, got {notes_len}"),
            ));
        }
    }

    ValidationResult { violations }
}

/// Validate and build a typed [`Signal`]. The payload is left untouched.
pub fn into_signal(payload: &SignalPayload) -> Result<Signal, ValidationResult> {
    let result = validate(payload);
    if !result.is_ok() {
        return Err(result);
    }

    // All unwrap_or fallbacks are unreachable after a passing validation.
    Ok(Signal {
        ticker: payload.ticker.clone().unwrap_or_default(),
        action: payload
            .action
            .as_deref()
            .and_then(Action::parse)
            .unwrap_or(Action::Buy),
        close: payload.close.unwrap_or_default(),
        contracts: payload
            .contracts
            .and_then(|n| u32::try_from(n).ok())
            .unwrap_or_default(),
        notes: payload.notes.clone().unwrap_or_default(),
    })
}
