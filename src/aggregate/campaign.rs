//! Campaign Aggregate
//!
//! The campaign is the only piece of shared mutable state in the engine.
//! Its financial counters (raised amount, sold shares, investor count) are
//! guarded by a monotonic version token and may only be mutated through the
//! conditional-update primitive on the campaign store.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::domain::{DomainError, DomainEvent};

/// Campaign lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CampaignStatus {
    Draft,
    Review,
    Live,
    Funded,
    Closed,
    Cancelled,
}

impl CampaignStatus {
    /// All statuses, in lifecycle order
    pub const ALL: [CampaignStatus; 6] = [
        CampaignStatus::Draft,
        CampaignStatus::Review,
        CampaignStatus::Live,
        CampaignStatus::Funded,
        CampaignStatus::Closed,
        CampaignStatus::Cancelled,
    ];

    /// Statuses reachable from this one. Cancelled is terminal.
    pub fn allowed_targets(&self) -> &'static [CampaignStatus] {
        match self {
            CampaignStatus::Draft => &[CampaignStatus::Review, CampaignStatus::Cancelled],
            CampaignStatus::Review => &[
                CampaignStatus::Live,
                CampaignStatus::Draft,
                CampaignStatus::Cancelled,
            ],
            CampaignStatus::Live => &[
                CampaignStatus::Funded,
                CampaignStatus::Closed,
                CampaignStatus::Cancelled,
            ],
            CampaignStatus::Funded => &[CampaignStatus::Cancelled],
            CampaignStatus::Closed => &[CampaignStatus::Cancelled],
            CampaignStatus::Cancelled => &[],
        }
    }

    /// Check whether this status may transition to `target`.
    /// Same-status transitions are never allowed.
    pub fn can_transition_to(&self, target: CampaignStatus) -> bool {
        self.allowed_targets().contains(&target)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            CampaignStatus::Draft => "DRAFT",
            CampaignStatus::Review => "REVIEW",
            CampaignStatus::Live => "LIVE",
            CampaignStatus::Funded => "FUNDED",
            CampaignStatus::Closed => "CLOSED",
            CampaignStatus::Cancelled => "CANCELLED",
        }
    }
}

impl fmt::Display for CampaignStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CampaignStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "DRAFT" => Ok(CampaignStatus::Draft),
            "REVIEW" => Ok(CampaignStatus::Review),
            "LIVE" => Ok(CampaignStatus::Live),
            "FUNDED" => Ok(CampaignStatus::Funded),
            "CLOSED" => Ok(CampaignStatus::Closed),
            "CANCELLED" => Ok(CampaignStatus::Cancelled),
            other => Err(format!("Unknown campaign status: {other}")),
        }
    }
}

/// Campaign Aggregate
///
/// Every committed investment or cancellation updates `raised_amount` and
/// `sold_shares` atomically together with `version`, keeping
/// `sold_shares * share_price` consistent with `raised_amount`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Campaign {
    pub id: Uuid,
    pub issuer_id: Uuid,
    pub status: CampaignStatus,
    pub target_amount: Decimal,
    pub min_investment: Decimal,
    pub max_investment: Option<Decimal>,
    pub raised_amount: Decimal,
    pub share_price: Decimal,
    pub total_shares: i64,
    pub sold_shares: i64,
    pub investor_count: i32,

    /// Optimistic-concurrency token; bumped by every committed mutation
    pub version: i64,

    /// Soft-delete flag; deleted campaigns are invisible to lookups
    pub deleted: bool,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Campaign {
    /// Create a new draft campaign
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        id: Uuid,
        issuer_id: Uuid,
        target_amount: Decimal,
        min_investment: Decimal,
        max_investment: Option<Decimal>,
        share_price: Decimal,
        total_shares: i64,
    ) -> Self {
        let now = Utc::now();
        Self {
            id,
            issuer_id,
            status: CampaignStatus::Draft,
            target_amount,
            min_investment,
            max_investment,
            raised_amount: Decimal::ZERO,
            share_price,
            total_shares,
            sold_shares: 0,
            investor_count: 0,
            version: 1,
            deleted: false,
            created_at: now,
            updated_at: now,
        }
    }

    /// Perform a lifecycle transition.
    ///
    /// Same-status transitions are always rejected, even when the target
    /// would otherwise be legal, to force callers to detect no-ops
    /// explicitly. On success the status is mutated in place and the
    /// lifecycle event is returned; no event exists on any failure path.
    pub fn transition(
        &mut self,
        target: CampaignStatus,
        triggered_by: Uuid,
    ) -> Result<DomainEvent, DomainError> {
        if target == self.status {
            return Err(DomainError::business_rule(format!(
                "Campaign is already in {} status",
                self.status
            )));
        }

        if !self.status.can_transition_to(target) {
            return Err(DomainError::business_rule(format!(
                "Cannot transition from {} to {}",
                self.status, target
            )));
        }

        let old_status = self.status;
        self.status = target;
        self.updated_at = Utc::now();

        Ok(DomainEvent::CampaignStatusChanged {
            campaign_id: self.id,
            old_status,
            new_status: target,
            triggered_by,
        })
    }

    /// Shares still available on the primary market
    pub fn remaining_shares(&self) -> i64 {
        self.total_shares - self.sold_shares
    }
}

/// Delta applied to a campaign's financial counters through the
/// conditional-update primitive on the campaign store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CampaignDelta {
    pub amount: Decimal,
    pub shares: i64,
    pub investors: i32,
}

impl CampaignDelta {
    /// Delta for a new investment
    pub fn invest(amount: Decimal, shares: i64) -> Self {
        Self {
            amount,
            shares,
            investors: 1,
        }
    }

    /// Exact negation, used when an investment is cancelled
    pub fn negate(&self) -> Self {
        Self {
            amount: -self.amount,
            shares: -self.shares,
            investors: -self.investors,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn live_campaign() -> Campaign {
        let mut campaign = Campaign::new(
            Uuid::new_v4(),
            Uuid::new_v4(),
            dec!(1000000),
            dec!(100),
            None,
            dec!(100),
            10000,
        );
        campaign.status = CampaignStatus::Live;
        campaign
    }

    #[test]
    fn test_same_status_transition_always_fails() {
        for status in CampaignStatus::ALL {
            let mut campaign = live_campaign();
            campaign.status = status;

            let result = campaign.transition(status, Uuid::new_v4());
            let err = result.unwrap_err();
            assert!(
                err.to_string().contains(&format!("already in {status} status")),
                "unexpected error for {status}: {err}"
            );
            assert_eq!(campaign.status, status, "status mutated on failure");
        }
    }

    #[test]
    fn test_transition_table_is_exhaustive() {
        use CampaignStatus::*;

        let allowed: &[(CampaignStatus, CampaignStatus)] = &[
            (Draft, Review),
            (Draft, Cancelled),
            (Review, Live),
            (Review, Draft),
            (Review, Cancelled),
            (Live, Funded),
            (Live, Closed),
            (Live, Cancelled),
            (Funded, Cancelled),
            (Closed, Cancelled),
        ];

        for from in CampaignStatus::ALL {
            for to in CampaignStatus::ALL {
                if from == to {
                    continue;
                }
                let mut campaign = live_campaign();
                campaign.status = from;
                let result = campaign.transition(to, Uuid::new_v4());

                if allowed.contains(&(from, to)) {
                    assert!(result.is_ok(), "{from} -> {to} should be allowed");
                    assert_eq!(campaign.status, to);
                } else {
                    let err = result.unwrap_err();
                    assert_eq!(
                        err.to_string(),
                        format!("Cannot transition from {from} to {to}")
                    );
                    assert_eq!(campaign.status, from);
                }
            }
        }
    }

    #[test]
    fn test_cancelled_has_no_successors() {
        assert!(CampaignStatus::Cancelled.allowed_targets().is_empty());
    }

    #[test]
    fn test_transition_emits_event() {
        let mut campaign = live_campaign();
        let admin = Uuid::new_v4();

        let event = campaign.transition(CampaignStatus::Funded, admin).unwrap();
        match event {
            DomainEvent::CampaignStatusChanged {
                campaign_id,
                old_status,
                new_status,
                triggered_by,
            } => {
                assert_eq!(campaign_id, campaign.id);
                assert_eq!(old_status, CampaignStatus::Live);
                assert_eq!(new_status, CampaignStatus::Funded);
                assert_eq!(triggered_by, admin);
            }
            other => panic!("unexpected event: {other:?}"),
        }
    }

    #[test]
    fn test_status_round_trip() {
        for status in CampaignStatus::ALL {
            let parsed: CampaignStatus = status.as_str().parse().unwrap();
            assert_eq!(parsed, status);
        }
        assert!("BOGUS".parse::<CampaignStatus>().is_err());
    }

    #[test]
    fn test_delta_negation() {
        let delta = CampaignDelta::invest(dec!(10000), 100);
        let negated = delta.negate();

        assert_eq!(negated.amount, dec!(-10000));
        assert_eq!(negated.shares, -100);
        assert_eq!(negated.investors, -1);
        assert_eq!(negated.negate(), delta);
    }

    #[test]
    fn test_remaining_shares() {
        let mut campaign = live_campaign();
        campaign.sold_shares = 400;
        assert_eq!(campaign.remaining_shares(), 9600);
    }
}
