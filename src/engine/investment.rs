//! Investment Engine
//!
//! Creates, cancels and completes primary investments against a campaign.
//! Each operation is one synchronous unit of work; the campaign's financial
//! counters are only ever touched through the conditional-update primitive
//! on the campaign store, keyed off the version read at the start of the
//! operation. A stale version fails the whole operation; the caller must
//! re-read and resubmit.

use std::sync::Arc;

use chrono::{Duration, Utc};
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::aggregate::{CampaignDelta, Investment, LedgerEntry};
use crate::domain::{whole_shares, Amount, DomainError, DomainEvent, EventPublisher};
use crate::error::{AppError, AppResult};
use crate::store::{CampaignStore, InvestmentStore, InvestorStore, LedgerStore, StoreError};

use super::commands::CreateInvestmentCommand;
use super::policy::InvestmentValidator;

/// Engine for primary-market investments
pub struct InvestmentEngine {
    campaigns: Arc<dyn CampaignStore>,
    investors: Arc<dyn InvestorStore>,
    investments: Arc<dyn InvestmentStore>,
    ledger: Arc<dyn LedgerStore>,
    validator: Arc<dyn InvestmentValidator>,
    publisher: Arc<dyn EventPublisher>,
    cooling_off: Duration,
}

impl InvestmentEngine {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        campaigns: Arc<dyn CampaignStore>,
        investors: Arc<dyn InvestorStore>,
        investments: Arc<dyn InvestmentStore>,
        ledger: Arc<dyn LedgerStore>,
        validator: Arc<dyn InvestmentValidator>,
        publisher: Arc<dyn EventPublisher>,
        cooling_off_hours: i64,
    ) -> Self {
        Self {
            campaigns,
            investors,
            investments,
            ledger,
            validator,
            publisher,
            cooling_off: Duration::hours(cooling_off_hours),
        }
    }

    /// Create a primary investment.
    ///
    /// The requested amount is floored to a whole-share multiple of the
    /// campaign's share price; the excess is never invested. The campaign
    /// delta is applied conditioned on the version read at the start of the
    /// operation, and a stale version fails the operation with the
    /// investment and ledger rows compensated away.
    pub async fn create_investment(
        &self,
        investor_id: Uuid,
        cmd: CreateInvestmentCommand,
    ) -> AppResult<Investment> {
        let investor = self
            .investors
            .find(investor_id)
            .await?
            .ok_or_else(|| DomainError::not_found("User", investor_id))?;

        let campaign = self
            .campaigns
            .find(cmd.campaign_id)
            .await?
            .ok_or_else(|| DomainError::not_found("Campaign", cmd.campaign_id))?;

        let amount = Amount::new(cmd.amount)
            .map_err(|e| AppError::InvalidRequest(format!("Invalid amount: {e}")))?;

        let has_existing = self
            .investments
            .exists_live_for(investor_id, campaign.id)
            .await?;

        self.validator
            .validate(&investor, &campaign, amount.value(), has_existing)
            .await?;

        let shares = whole_shares(amount.value(), campaign.share_price);
        if shares == 0 {
            return Err(DomainError::business_rule(
                "Investment amount is too small to purchase any shares",
            )
            .into());
        }

        if shares > campaign.remaining_shares() {
            return Err(DomainError::business_rule(format!(
                "Only {} shares are available in this campaign",
                campaign.remaining_shares()
            ))
            .into());
        }

        // Amount actually invested; the remainder of a non-exact multiple
        // is dropped, not held.
        let actual_amount = Decimal::from(shares) * campaign.share_price;

        let investment = Investment::new(
            investor_id,
            campaign.id,
            actual_amount,
            shares,
            campaign.share_price,
            cmd.payment_method,
            Utc::now() + self.cooling_off,
        );
        let entry = LedgerEntry::investment(investment.id, actual_amount, cmd.payment_method);

        self.investments.insert(&investment).await?;
        self.ledger.append(&entry).await?;

        let delta = CampaignDelta::invest(actual_amount, shares);
        let applied = match self
            .campaigns
            .apply_delta(campaign.id, campaign.version, &delta)
            .await
        {
            Ok(applied) => applied,
            Err(e) => {
                // The delta never committed; compensate so no orphan
                // investment survives the failed unit of work.
                self.remove_created_rows(&investment, &entry).await?;
                return Err(e.into());
            }
        };

        if !applied {
            // Another writer won the race.
            self.remove_created_rows(&investment, &entry).await?;

            tracing::warn!(
                campaign_id = %campaign.id,
                expected_version = campaign.version,
                "campaign delta rejected, version was stale"
            );
            return Err(DomainError::ConcurrencyConflict {
                campaign_id: campaign.id,
            }
            .into());
        }

        self.publisher.publish(DomainEvent::InvestmentCreated {
            investor_id,
            campaign_id: campaign.id,
            amount: actual_amount,
        });

        tracing::info!(
            investment_id = %investment.id,
            campaign_id = %campaign.id,
            %actual_amount,
            shares,
            "investment created"
        );

        Ok(investment)
    }

    /// Cancel an investment inside the cooling-off window.
    ///
    /// Applies the exact negation of the creation delta to the campaign
    /// (keyed off its current version), marks the investment cancelled and
    /// appends a refund ledger entry for the original amount.
    pub async fn cancel_investment(
        &self,
        investment_id: Uuid,
        requester_id: Uuid,
    ) -> AppResult<Investment> {
        let mut investment = self
            .investments
            .find(investment_id)
            .await?
            .ok_or_else(|| DomainError::not_found("Investment", investment_id))?;

        if investment.investor_id != requester_id {
            return Err(DomainError::business_rule(
                "You are not authorized to cancel this investment",
            )
            .into());
        }

        let campaign = self
            .campaigns
            .find(investment.campaign_id)
            .await?
            .ok_or_else(|| DomainError::not_found("Campaign", investment.campaign_id))?;

        // Status and window guards; nothing is persisted if this fails.
        let original = investment.clone();
        investment.cancel(Utc::now())?;

        // Same ordering as creation: the entity rows go in first, then the
        // delta decides whether the unit of work stands.
        let refund = LedgerEntry::refund(
            investment.id,
            investment.amount,
            investment.payment_method,
        );
        self.investments.update(&investment).await?;
        self.ledger.append(&refund).await?;

        let delta = CampaignDelta::invest(investment.amount, investment.shares).negate();
        let applied = match self
            .campaigns
            .apply_delta(campaign.id, campaign.version, &delta)
            .await
        {
            Ok(applied) => applied,
            Err(e) => {
                self.restore_cancelled_rows(&original, &refund).await?;
                return Err(e.into());
            }
        };

        if !applied {
            self.restore_cancelled_rows(&original, &refund).await?;
            return Err(DomainError::ConcurrencyConflict {
                campaign_id: campaign.id,
            }
            .into());
        }

        tracing::info!(
            investment_id = %investment.id,
            campaign_id = %campaign.id,
            amount = %investment.amount,
            "investment cancelled during cooling-off"
        );

        Ok(investment)
    }

    /// Undo the rows inserted by a create whose campaign delta did not
    /// commit
    async fn remove_created_rows(
        &self,
        investment: &Investment,
        entry: &LedgerEntry,
    ) -> Result<(), StoreError> {
        self.ledger.remove(entry.id).await?;
        self.investments.remove(investment.id).await?;
        Ok(())
    }

    /// Undo the rows written by a cancellation whose negation delta did
    /// not commit, restoring the investment as it was loaded
    async fn restore_cancelled_rows(
        &self,
        original: &Investment,
        refund: &LedgerEntry,
    ) -> Result<(), StoreError> {
        self.ledger.remove(refund.id).await?;
        self.investments.update(original).await?;
        Ok(())
    }

    /// Mark an investment's money as settled.
    ///
    /// Campaign totals are untouched; they were applied at creation time.
    pub async fn complete_investment(&self, investment_id: Uuid) -> AppResult<Investment> {
        let mut investment = self
            .investments
            .find(investment_id)
            .await?
            .ok_or_else(|| DomainError::not_found("Investment", investment_id))?;

        investment.complete(Utc::now())?;
        self.investments.update(&investment).await?;

        tracing::info!(investment_id = %investment.id, "investment completed");

        Ok(investment)
    }

    /// Look up a single investment
    pub async fn get_investment(&self, investment_id: Uuid) -> AppResult<Investment> {
        self.investments
            .find(investment_id)
            .await?
            .ok_or_else(|| DomainError::not_found("Investment", investment_id).into())
    }
}
