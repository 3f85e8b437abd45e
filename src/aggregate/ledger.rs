//! Ledger Entries
//!
//! One row per money movement, append-only. The payment orchestration layer
//! (out of scope) settles these against the external gateway; the engine
//! records them as they are produced.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use super::investment::PaymentMethod;

/// Default settlement currency
pub const DEFAULT_CURRENCY: &str = "KES";

/// Kind of money movement recorded in the ledger
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LedgerEntryType {
    Investment,
    Refund,
}

impl LedgerEntryType {
    pub fn as_str(&self) -> &'static str {
        match self {
            LedgerEntryType::Investment => "INVESTMENT",
            LedgerEntryType::Refund => "REFUND",
        }
    }
}

impl fmt::Display for LedgerEntryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LedgerEntryType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "INVESTMENT" => Ok(LedgerEntryType::Investment),
            "REFUND" => Ok(LedgerEntryType::Refund),
            other => Err(format!("Unknown ledger entry type: {other}")),
        }
    }
}

/// Append-only ledger row
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedgerEntry {
    pub id: Uuid,
    pub entry_type: LedgerEntryType,
    pub amount: Decimal,
    pub currency: String,
    pub payment_method: PaymentMethod,
    pub investment_id: Uuid,
    pub created_at: DateTime<Utc>,
}

impl LedgerEntry {
    /// Record money moving into a campaign for an investment
    pub fn investment(investment_id: Uuid, amount: Decimal, payment_method: PaymentMethod) -> Self {
        Self::record(LedgerEntryType::Investment, investment_id, amount, payment_method)
    }

    /// Record money returned to the investor for a cancellation
    pub fn refund(investment_id: Uuid, amount: Decimal, payment_method: PaymentMethod) -> Self {
        Self::record(LedgerEntryType::Refund, investment_id, amount, payment_method)
    }

    fn record(
        entry_type: LedgerEntryType,
        investment_id: Uuid,
        amount: Decimal,
        payment_method: PaymentMethod,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            entry_type,
            amount,
            currency: DEFAULT_CURRENCY.to_string(),
            payment_method,
            investment_id,
            created_at: Utc::now(),
        }
    }
}
