//! Marketplace Engine
//!
//! Secondary-market resale of completed investments. Listings are created
//! against shares the seller actually owns, expire lazily at access time,
//! and produce an immutable sale record when bought. Campaign financial
//! counters are never touched here; secondary trades move ownership, not
//! the raise.

use std::sync::Arc;

use chrono::{Duration, Utc};
use uuid::Uuid;

use crate::aggregate::{MarketplaceListing, MarketplaceSale};
use crate::domain::{DomainError, DomainEvent, EventPublisher};
use crate::error::AppResult;
use crate::store::{InvestmentStore, ListingStore, SaleStore};

use super::commands::CreateListingCommand;
use super::policy::MarketplacePolicy;

/// Engine for secondary-market listings and sales
pub struct MarketplaceEngine {
    listings: Arc<dyn ListingStore>,
    sales: Arc<dyn SaleStore>,
    investments: Arc<dyn InvestmentStore>,
    policy: Arc<dyn MarketplacePolicy>,
    publisher: Arc<dyn EventPublisher>,
    listing_window: Duration,
}

impl MarketplaceEngine {
    pub fn new(
        listings: Arc<dyn ListingStore>,
        sales: Arc<dyn SaleStore>,
        investments: Arc<dyn InvestmentStore>,
        policy: Arc<dyn MarketplacePolicy>,
        publisher: Arc<dyn EventPublisher>,
        listing_duration_days: i64,
    ) -> Self {
        Self {
            listings,
            sales,
            investments,
            policy,
            publisher,
            listing_window: Duration::days(listing_duration_days),
        }
    }

    /// List shares from a completed investment for resale.
    ///
    /// The seller must own the investment, the policy's holding-period and
    /// consent rules must pass, the share count must not exceed the
    /// holding, and no other listing for the investment may be active.
    pub async fn create_listing(
        &self,
        seller_id: Uuid,
        cmd: CreateListingCommand,
    ) -> AppResult<MarketplaceListing> {
        let investment = self
            .investments
            .find(cmd.investment_id)
            .await?
            .ok_or_else(|| DomainError::not_found("Investment", cmd.investment_id))?;

        if investment.investor_id != seller_id {
            return Err(
                DomainError::forbidden("You can only list your own investments").into(),
            );
        }

        self.policy
            .validate_listing(&investment, cmd.company_consent)
            .await?;

        if cmd.shares_listed <= 0 {
            return Err(DomainError::business_rule(
                "Number of shares to list must be positive",
            )
            .into());
        }

        if cmd.shares_listed > investment.shares {
            return Err(DomainError::business_rule(format!(
                "Cannot list {} shares - you only own {}",
                cmd.shares_listed, investment.shares
            ))
            .into());
        }

        if self
            .listings
            .find_active_by_investment(investment.id)
            .await?
            .is_some()
        {
            return Err(DomainError::business_rule(
                "An active listing already exists for this investment",
            )
            .into());
        }

        let total_price = rust_decimal::Decimal::from(cmd.shares_listed) * cmd.price_per_share;
        let listing = MarketplaceListing::new(
            seller_id,
            investment.id,
            investment.campaign_id,
            cmd.shares_listed,
            cmd.price_per_share,
            self.policy.seller_fee(total_price),
            Utc::now() + self.listing_window,
        );

        self.listings.insert(&listing).await?;

        self.publisher.publish(DomainEvent::ListingCreated {
            seller_id,
            shares_listed: listing.shares_listed,
        });

        tracing::info!(
            listing_id = %listing.id,
            investment_id = %investment.id,
            shares = listing.shares_listed,
            total_price = %listing.total_price,
            "listing created"
        );

        Ok(listing)
    }

    /// Cancel an active listing. Only the seller may cancel.
    pub async fn cancel_listing(
        &self,
        listing_id: Uuid,
        requester_id: Uuid,
    ) -> AppResult<MarketplaceListing> {
        let mut listing = self
            .listings
            .find(listing_id)
            .await?
            .ok_or_else(|| DomainError::not_found("Listing", listing_id))?;

        if listing.seller_id != requester_id {
            return Err(DomainError::forbidden("You can only cancel your own listings").into());
        }

        listing.cancel()?;
        self.listings.update(&listing).await?;

        tracing::info!(listing_id = %listing.id, "listing cancelled");

        Ok(listing)
    }

    /// Buy an active listing.
    ///
    /// Expiry is discovered here: a past-due listing is persisted as
    /// EXPIRED and the purchase rejected. A successful purchase records a
    /// completed sale with the platform fee deducted from the seller's
    /// proceeds.
    pub async fn buy_listing(
        &self,
        listing_id: Uuid,
        buyer_id: Uuid,
    ) -> AppResult<MarketplaceSale> {
        let mut listing = self
            .listings
            .find(listing_id)
            .await?
            .ok_or_else(|| DomainError::not_found("Listing", listing_id))?;

        if listing.status != crate::aggregate::ListingStatus::Active {
            return Err(DomainError::business_rule("This listing is no longer available").into());
        }

        if listing.seller_id == buyer_id {
            return Err(
                DomainError::business_rule("You cannot purchase your own listing").into(),
            );
        }

        let now = Utc::now();
        if listing.is_expired(now) {
            listing.mark_expired();
            self.listings.update(&listing).await?;

            tracing::info!(listing_id = %listing.id, "listing expired at access");
            return Err(DomainError::business_rule("This listing has expired").into());
        }

        listing.mark_sold(buyer_id, now);
        let sale = MarketplaceSale::from_listing(&listing, buyer_id);

        self.listings.update(&listing).await?;
        self.sales.insert(&sale).await?;

        tracing::info!(
            listing_id = %listing.id,
            sale_id = %sale.id,
            buyer_id = %buyer_id,
            total_amount = %sale.total_amount,
            net_amount = %sale.net_amount,
            "listing sold"
        );

        Ok(sale)
    }

    /// Look up a listing, surfacing lazy expiry to the reader as well
    pub async fn get_listing(&self, listing_id: Uuid) -> AppResult<MarketplaceListing> {
        let mut listing = self
            .listings
            .find(listing_id)
            .await?
            .ok_or_else(|| DomainError::not_found("Listing", listing_id))?;

        if listing.status == crate::aggregate::ListingStatus::Active
            && listing.is_expired(Utc::now())
        {
            listing.mark_expired();
            self.listings.update(&listing).await?;
        }

        Ok(listing)
    }
}
