//! Marketplace Entities
//!
//! Secondary-market resale listings and the sales they produce. A listing
//! offers already-owned shares; buying one records a sale with the platform
//! fee deducted from the seller's proceeds. The original investment's
//! primary-market accounting is never touched.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::domain::DomainError;

/// Listing lifecycle status. Sold, Cancelled and Expired are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ListingStatus {
    Active,
    Sold,
    Cancelled,
    Expired,
}

impl ListingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ListingStatus::Active => "ACTIVE",
            ListingStatus::Sold => "SOLD",
            ListingStatus::Cancelled => "CANCELLED",
            ListingStatus::Expired => "EXPIRED",
        }
    }
}

impl fmt::Display for ListingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ListingStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ACTIVE" => Ok(ListingStatus::Active),
            "SOLD" => Ok(ListingStatus::Sold),
            "CANCELLED" => Ok(ListingStatus::Cancelled),
            "EXPIRED" => Ok(ListingStatus::Expired),
            other => Err(format!("Unknown listing status: {other}")),
        }
    }
}

/// An offer to resell already-owned shares on the secondary marketplace
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarketplaceListing {
    pub id: Uuid,
    pub seller_id: Uuid,
    pub investment_id: Uuid,
    pub campaign_id: Uuid,

    pub shares_listed: i64,
    pub price_per_share: Decimal,
    pub total_price: Decimal,
    pub seller_fee: Decimal,

    pub status: ListingStatus,
    pub buyer_id: Option<Uuid>,
    pub sold_at: Option<DateTime<Utc>>,
    pub expires_at: DateTime<Utc>,

    pub created_at: DateTime<Utc>,
}

impl MarketplaceListing {
    /// Create a new active listing
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        seller_id: Uuid,
        investment_id: Uuid,
        campaign_id: Uuid,
        shares_listed: i64,
        price_per_share: Decimal,
        seller_fee: Decimal,
        expires_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            seller_id,
            investment_id,
            campaign_id,
            shares_listed,
            price_per_share,
            total_price: Decimal::from(shares_listed) * price_per_share,
            seller_fee,
            status: ListingStatus::Active,
            buyer_id: None,
            sold_at: None,
            expires_at,
            created_at: Utc::now(),
        }
    }

    /// Wall-clock expiry check, evaluated at call time. Expiry is discovered
    /// on access; there is no background sweep.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now > self.expires_at
    }

    /// Cancel an active listing
    pub fn cancel(&mut self) -> Result<(), DomainError> {
        if self.status != ListingStatus::Active {
            return Err(DomainError::business_rule(
                "Only active listings can be cancelled",
            ));
        }
        self.status = ListingStatus::Cancelled;
        Ok(())
    }

    /// Transition to Expired, persisted when the expiry is discovered
    pub fn mark_expired(&mut self) {
        self.status = ListingStatus::Expired;
    }

    /// Transition to Sold with the buyer recorded
    pub fn mark_sold(&mut self, buyer_id: Uuid, now: DateTime<Utc>) {
        self.status = ListingStatus::Sold;
        self.buyer_id = Some(buyer_id);
        self.sold_at = Some(now);
    }

    /// What the seller actually receives: total price minus the platform fee
    pub fn net_amount(&self) -> Decimal {
        self.total_price - self.seller_fee
    }
}

/// Status of a marketplace sale
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SaleStatus {
    Completed,
}

impl SaleStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SaleStatus::Completed => "COMPLETED",
        }
    }
}

impl fmt::Display for SaleStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A completed secondary-market sale. Created once per successful purchase;
/// immutable afterwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarketplaceSale {
    pub id: Uuid,
    pub listing_id: Uuid,
    pub buyer_id: Uuid,
    pub seller_id: Uuid,
    pub shares: i64,
    pub total_amount: Decimal,
    pub seller_fee: Decimal,

    /// total_amount - seller_fee
    pub net_amount: Decimal,

    pub status: SaleStatus,
    pub created_at: DateTime<Utc>,
}

impl MarketplaceSale {
    /// Record the sale of a listing to a buyer
    pub fn from_listing(listing: &MarketplaceListing, buyer_id: Uuid) -> Self {
        Self {
            id: Uuid::new_v4(),
            listing_id: listing.id,
            buyer_id,
            seller_id: listing.seller_id,
            shares: listing.shares_listed,
            total_amount: listing.total_price,
            seller_fee: listing.seller_fee,
            net_amount: listing.net_amount(),
            status: SaleStatus::Completed,
            created_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use rust_decimal_macros::dec;

    fn active_listing() -> MarketplaceListing {
        MarketplaceListing::new(
            Uuid::new_v4(),
            Uuid::new_v4(),
            Uuid::new_v4(),
            100,
            dec!(100),
            dec!(200),
            Utc::now() + Duration::days(30),
        )
    }

    #[test]
    fn test_total_price_is_shares_times_price() {
        let listing = active_listing();
        assert_eq!(listing.total_price, dec!(10000));
    }

    #[test]
    fn test_net_amount_deducts_fee() {
        let listing = active_listing();
        assert_eq!(listing.net_amount(), dec!(9800.00));
    }

    #[test]
    fn test_cancel_active_listing() {
        let mut listing = active_listing();
        listing.cancel().unwrap();
        assert_eq!(listing.status, ListingStatus::Cancelled);
    }

    #[test]
    fn test_cancel_non_active_listing_rejected() {
        for status in [
            ListingStatus::Sold,
            ListingStatus::Cancelled,
            ListingStatus::Expired,
        ] {
            let mut listing = active_listing();
            listing.status = status;

            let err = listing.cancel().unwrap_err();
            assert_eq!(err.to_string(), "Only active listings can be cancelled");
        }
    }

    #[test]
    fn test_expiry_is_wall_clock() {
        let mut listing = active_listing();
        assert!(!listing.is_expired(Utc::now()));

        listing.expires_at = Utc::now() - Duration::minutes(1);
        assert!(listing.is_expired(Utc::now()));
    }

    #[test]
    fn test_mark_sold_records_buyer() {
        let mut listing = active_listing();
        let buyer = Uuid::new_v4();
        let now = Utc::now();

        listing.mark_sold(buyer, now);

        assert_eq!(listing.status, ListingStatus::Sold);
        assert_eq!(listing.buyer_id, Some(buyer));
        assert_eq!(listing.sold_at, Some(now));
    }

    #[test]
    fn test_sale_from_listing() {
        let listing = active_listing();
        let buyer = Uuid::new_v4();

        let sale = MarketplaceSale::from_listing(&listing, buyer);

        assert_eq!(sale.listing_id, listing.id);
        assert_eq!(sale.buyer_id, buyer);
        assert_eq!(sale.seller_id, listing.seller_id);
        assert_eq!(sale.shares, 100);
        assert_eq!(sale.total_amount, dec!(10000));
        assert_eq!(sale.seller_fee, dec!(200));
        assert_eq!(sale.net_amount, dec!(9800.00));
        assert_eq!(sale.status, SaleStatus::Completed);
    }
}
