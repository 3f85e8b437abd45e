//! In-memory store
//!
//! HashMap-backed implementation of all storage ports behind a single
//! mutex. Backs the test suite and lightweight embeddings; the version
//! discipline on campaigns is identical to the Postgres implementation.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use crate::aggregate::{
    Campaign, CampaignDelta, Investment, InvestmentStatus, Investor, LedgerEntry, ListingStatus,
    MarketplaceListing, MarketplaceSale,
};

use super::{
    CampaignStore, InvestmentStore, InvestorStore, LedgerStore, ListingStore, SaleStore,
    StoreError,
};

#[derive(Debug, Default)]
struct Tables {
    campaigns: HashMap<Uuid, Campaign>,
    investors: HashMap<Uuid, Investor>,
    investments: HashMap<Uuid, Investment>,
    ledger: Vec<LedgerEntry>,
    listings: HashMap<Uuid, MarketplaceListing>,
    sales: Vec<MarketplaceSale>,
}

/// In-memory implementation of every storage port
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Tables> {
        self.tables.lock().expect("store lock poisoned")
    }

    /// Raw campaign read, ignoring the soft-delete filter. Test helper.
    pub fn campaign_unfiltered(&self, id: Uuid) -> Option<Campaign> {
        self.lock().campaigns.get(&id).cloned()
    }

    /// Bump a campaign's version out-of-band, simulating a concurrent
    /// writer winning the race. Test helper.
    pub fn bump_campaign_version(&self, id: Uuid) {
        if let Some(campaign) = self.lock().campaigns.get_mut(&id) {
            campaign.version += 1;
        }
    }

    /// All ledger rows, in append order. Test helper.
    pub fn ledger_entries(&self) -> Vec<LedgerEntry> {
        self.lock().ledger.clone()
    }
}

#[async_trait]
impl CampaignStore for MemoryStore {
    async fn find(&self, id: Uuid) -> Result<Option<Campaign>, StoreError> {
        Ok(self
            .lock()
            .campaigns
            .get(&id)
            .filter(|c| !c.deleted)
            .cloned())
    }

    async fn insert(&self, campaign: &Campaign) -> Result<(), StoreError> {
        self.lock().campaigns.insert(campaign.id, campaign.clone());
        Ok(())
    }

    async fn update(&self, campaign: &Campaign) -> Result<(), StoreError> {
        let mut tables = self.lock();
        let mut stored = campaign.clone();
        stored.version += 1;
        stored.updated_at = Utc::now();
        tables.campaigns.insert(stored.id, stored);
        Ok(())
    }

    async fn apply_delta(
        &self,
        id: Uuid,
        expected_version: i64,
        delta: &CampaignDelta,
    ) -> Result<bool, StoreError> {
        let mut tables = self.lock();
        let Some(campaign) = tables.campaigns.get_mut(&id) else {
            return Ok(false);
        };

        if campaign.deleted || campaign.version != expected_version {
            return Ok(false);
        }

        campaign.raised_amount += delta.amount;
        campaign.sold_shares += delta.shares;
        campaign.investor_count += delta.investors;
        campaign.version += 1;
        campaign.updated_at = Utc::now();
        Ok(true)
    }
}

#[async_trait]
impl InvestorStore for MemoryStore {
    async fn find(&self, id: Uuid) -> Result<Option<Investor>, StoreError> {
        Ok(self
            .lock()
            .investors
            .get(&id)
            .filter(|i| !i.deleted)
            .cloned())
    }

    async fn insert(&self, investor: &Investor) -> Result<(), StoreError> {
        self.lock().investors.insert(investor.id, investor.clone());
        Ok(())
    }
}

#[async_trait]
impl InvestmentStore for MemoryStore {
    async fn find(&self, id: Uuid) -> Result<Option<Investment>, StoreError> {
        Ok(self.lock().investments.get(&id).cloned())
    }

    async fn insert(&self, investment: &Investment) -> Result<(), StoreError> {
        self.lock()
            .investments
            .insert(investment.id, investment.clone());
        Ok(())
    }

    async fn update(&self, investment: &Investment) -> Result<(), StoreError> {
        self.lock()
            .investments
            .insert(investment.id, investment.clone());
        Ok(())
    }

    async fn exists_live_for(
        &self,
        investor_id: Uuid,
        campaign_id: Uuid,
    ) -> Result<bool, StoreError> {
        Ok(self.lock().investments.values().any(|inv| {
            inv.investor_id == investor_id
                && inv.campaign_id == campaign_id
                && !matches!(
                    inv.status,
                    InvestmentStatus::Cancelled | InvestmentStatus::Refunded
                )
        }))
    }

    async fn remove(&self, id: Uuid) -> Result<(), StoreError> {
        self.lock().investments.remove(&id);
        Ok(())
    }
}

#[async_trait]
impl LedgerStore for MemoryStore {
    async fn append(&self, entry: &LedgerEntry) -> Result<(), StoreError> {
        self.lock().ledger.push(entry.clone());
        Ok(())
    }

    async fn find_by_investment(
        &self,
        investment_id: Uuid,
    ) -> Result<Vec<LedgerEntry>, StoreError> {
        Ok(self
            .lock()
            .ledger
            .iter()
            .filter(|e| e.investment_id == investment_id)
            .cloned()
            .collect())
    }

    async fn remove(&self, id: Uuid) -> Result<(), StoreError> {
        self.lock().ledger.retain(|e| e.id != id);
        Ok(())
    }
}

#[async_trait]
impl ListingStore for MemoryStore {
    async fn find(&self, id: Uuid) -> Result<Option<MarketplaceListing>, StoreError> {
        Ok(self.lock().listings.get(&id).cloned())
    }

    async fn insert(&self, listing: &MarketplaceListing) -> Result<(), StoreError> {
        self.lock().listings.insert(listing.id, listing.clone());
        Ok(())
    }

    async fn update(&self, listing: &MarketplaceListing) -> Result<(), StoreError> {
        self.lock().listings.insert(listing.id, listing.clone());
        Ok(())
    }

    async fn find_active_by_investment(
        &self,
        investment_id: Uuid,
    ) -> Result<Option<MarketplaceListing>, StoreError> {
        Ok(self
            .lock()
            .listings
            .values()
            .find(|l| l.investment_id == investment_id && l.status == ListingStatus::Active)
            .cloned())
    }
}

#[async_trait]
impl SaleStore for MemoryStore {
    async fn insert(&self, sale: &MarketplaceSale) -> Result<(), StoreError> {
        self.lock().sales.push(sale.clone());
        Ok(())
    }

    async fn find_by_listing(
        &self,
        listing_id: Uuid,
    ) -> Result<Vec<MarketplaceSale>, StoreError> {
        Ok(self
            .lock()
            .sales
            .iter()
            .filter(|s| s.listing_id == listing_id)
            .cloned()
            .collect())
    }
}
