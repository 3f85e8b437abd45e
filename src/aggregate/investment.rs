//! Investment Entity
//!
//! A primary-market investment against a campaign. Investments are created
//! Pending, may be cancelled inside the cooling-off window, and are never
//! physically deleted once committed (audit trail).

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::domain::DomainError;

/// Investment lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InvestmentStatus {
    Pending,
    PaymentInitiated,
    CoolingOff,
    Completed,
    Cancelled,
    Refunded,
}

impl InvestmentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            InvestmentStatus::Pending => "PENDING",
            InvestmentStatus::PaymentInitiated => "PAYMENT_INITIATED",
            InvestmentStatus::CoolingOff => "COOLING_OFF",
            InvestmentStatus::Completed => "COMPLETED",
            InvestmentStatus::Cancelled => "CANCELLED",
            InvestmentStatus::Refunded => "REFUNDED",
        }
    }
}

impl fmt::Display for InvestmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for InvestmentStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PENDING" => Ok(InvestmentStatus::Pending),
            "PAYMENT_INITIATED" => Ok(InvestmentStatus::PaymentInitiated),
            "COOLING_OFF" => Ok(InvestmentStatus::CoolingOff),
            "COMPLETED" => Ok(InvestmentStatus::Completed),
            "CANCELLED" => Ok(InvestmentStatus::Cancelled),
            "REFUNDED" => Ok(InvestmentStatus::Refunded),
            other => Err(format!("Unknown investment status: {other}")),
        }
    }
}

/// Payment rail the investor chose. The wire protocols behind these are an
/// opaque collaborator; the engine only records the tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentMethod {
    Mpesa,
    Card,
    Bank,
}

impl PaymentMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::Mpesa => "MPESA",
            PaymentMethod::Card => "CARD",
            PaymentMethod::Bank => "BANK",
        }
    }
}

impl fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PaymentMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "MPESA" => Ok(PaymentMethod::Mpesa),
            "CARD" => Ok(PaymentMethod::Card),
            "BANK" => Ok(PaymentMethod::Bank),
            other => Err(format!("Unknown payment method: {other}")),
        }
    }
}

/// Primary-market investment
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Investment {
    pub id: Uuid,
    pub investor_id: Uuid,
    pub campaign_id: Uuid,

    /// Amount actually invested; always a whole-share multiple of the
    /// share price snapshot
    pub amount: Decimal,
    pub shares: i64,

    /// Share price at creation time
    pub share_price: Decimal,

    pub payment_method: PaymentMethod,
    pub status: InvestmentStatus,

    pub cooling_off_expires_at: DateTime<Utc>,
    pub cancelled_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub cancellation_reason: Option<String>,

    pub created_at: DateTime<Utc>,
}

impl Investment {
    /// Create a new pending investment
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        investor_id: Uuid,
        campaign_id: Uuid,
        amount: Decimal,
        shares: i64,
        share_price: Decimal,
        payment_method: PaymentMethod,
        cooling_off_expires_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            investor_id,
            campaign_id,
            amount,
            shares,
            share_price,
            payment_method,
            status: InvestmentStatus::Pending,
            cooling_off_expires_at,
            cancelled_at: None,
            completed_at: None,
            cancellation_reason: None,
            created_at: Utc::now(),
        }
    }

    /// Cancel inside the cooling-off window.
    ///
    /// Only Pending and CoolingOff investments are cancellable here, and
    /// only while the window is open. Nothing is mutated on failure.
    pub fn cancel(&mut self, now: DateTime<Utc>) -> Result<(), DomainError> {
        if !matches!(
            self.status,
            InvestmentStatus::Pending | InvestmentStatus::CoolingOff
        ) {
            return Err(DomainError::business_rule(format!(
                "Investment cannot be cancelled in status {}",
                self.status
            )));
        }

        if now > self.cooling_off_expires_at {
            return Err(DomainError::business_rule(
                "Cooling-off period has expired",
            ));
        }

        self.status = InvestmentStatus::Cancelled;
        self.cancelled_at = Some(now);
        self.cancellation_reason =
            Some("Cancelled by investor during cooling-off period".to_string());
        Ok(())
    }

    /// Mark the money as settled.
    ///
    /// Does not touch campaign totals; those were applied at creation time.
    pub fn complete(&mut self, now: DateTime<Utc>) -> Result<(), DomainError> {
        if !matches!(
            self.status,
            InvestmentStatus::Pending
                | InvestmentStatus::PaymentInitiated
                | InvestmentStatus::CoolingOff
        ) {
            return Err(DomainError::business_rule(format!(
                "Investment cannot be completed from status {}",
                self.status
            )));
        }

        self.status = InvestmentStatus::Completed;
        self.completed_at = Some(now);
        Ok(())
    }
}
