//! Investor Entity
//!
//! Slim investor profile carrying only what the investment flow needs:
//! identity, KYC status and the active/soft-delete flags. KYC document
//! review itself lives outside this engine.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// KYC verification status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum KycStatus {
    Pending,
    Approved,
    Rejected,
}

impl KycStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            KycStatus::Pending => "PENDING",
            KycStatus::Approved => "APPROVED",
            KycStatus::Rejected => "REJECTED",
        }
    }
}

impl fmt::Display for KycStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for KycStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PENDING" => Ok(KycStatus::Pending),
            "APPROVED" => Ok(KycStatus::Approved),
            "REJECTED" => Ok(KycStatus::Rejected),
            other => Err(format!("Unknown KYC status: {other}")),
        }
    }
}

/// Investor profile
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Investor {
    pub id: Uuid,
    pub email: String,
    pub full_name: String,
    pub kyc_status: KycStatus,
    pub active: bool,
    pub deleted: bool,
    pub created_at: DateTime<Utc>,
}

impl Investor {
    pub fn new(id: Uuid, email: impl Into<String>, full_name: impl Into<String>) -> Self {
        Self {
            id,
            email: email.into(),
            full_name: full_name.into(),
            kyc_status: KycStatus::Pending,
            active: true,
            deleted: false,
            created_at: Utc::now(),
        }
    }

    pub fn with_kyc(mut self, status: KycStatus) -> Self {
        self.kyc_status = status;
        self
    }

    pub fn is_kyc_approved(&self) -> bool {
        self.kyc_status == KycStatus::Approved
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_investor_defaults() {
        let investor = Investor::new(Uuid::new_v4(), "jane@example.com", "Jane Wanjiku");

        assert_eq!(investor.kyc_status, KycStatus::Pending);
        assert!(investor.active);
        assert!(!investor.deleted);
        assert!(!investor.is_kyc_approved());
    }

    #[test]
    fn test_with_kyc() {
        let investor = Investor::new(Uuid::new_v4(), "jane@example.com", "Jane Wanjiku")
            .with_kyc(KycStatus::Approved);

        assert!(investor.is_kyc_approved());
    }
}
