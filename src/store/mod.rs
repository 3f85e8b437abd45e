//! Storage ports
//!
//! CRUD-plus-CAS ports for each entity. Persistence technology stays behind
//! these traits: [`postgres::PgStore`] is the production implementation,
//! [`memory::MemoryStore`] backs the test suite and embeddings.
//!
//! The campaign port carries the engine's single concurrency primitive:
//! [`CampaignStore::apply_delta`] applies a financial delta conditioned on
//! the version the caller read, incrementing the version atomically in the
//! same operation. A `false` return means the caller's version was stale.

pub mod error;
pub mod memory;
pub mod postgres;

pub use error::StoreError;
pub use memory::MemoryStore;
pub use postgres::PgStore;

use async_trait::async_trait;
use uuid::Uuid;

use crate::aggregate::{
    Campaign, CampaignDelta, Investment, Investor, LedgerEntry, MarketplaceListing,
    MarketplaceSale,
};

/// Campaign persistence with the conditional-update primitive
#[async_trait]
pub trait CampaignStore: Send + Sync {
    /// Find a non-deleted campaign
    async fn find(&self, id: Uuid) -> Result<Option<Campaign>, StoreError>;

    async fn insert(&self, campaign: &Campaign) -> Result<(), StoreError>;

    /// Persist non-financial fields (status, timestamps), bumping the
    /// version so concurrent financial updates see the change.
    async fn update(&self, campaign: &Campaign) -> Result<(), StoreError>;

    /// Apply `delta` to the financial counters where the stored version
    /// still equals `expected_version`, incrementing the version in the
    /// same atomic operation. Returns `false` when zero rows matched.
    async fn apply_delta(
        &self,
        id: Uuid,
        expected_version: i64,
        delta: &CampaignDelta,
    ) -> Result<bool, StoreError>;
}

/// Investor lookup
#[async_trait]
pub trait InvestorStore: Send + Sync {
    /// Find a non-deleted investor
    async fn find(&self, id: Uuid) -> Result<Option<Investor>, StoreError>;

    async fn insert(&self, investor: &Investor) -> Result<(), StoreError>;
}

/// Investment persistence
#[async_trait]
pub trait InvestmentStore: Send + Sync {
    async fn find(&self, id: Uuid) -> Result<Option<Investment>, StoreError>;

    async fn insert(&self, investment: &Investment) -> Result<(), StoreError>;

    async fn update(&self, investment: &Investment) -> Result<(), StoreError>;

    /// Whether the investor already holds a live (non-cancelled,
    /// non-refunded) investment in the campaign
    async fn exists_live_for(
        &self,
        investor_id: Uuid,
        campaign_id: Uuid,
    ) -> Result<bool, StoreError>;

    /// Remove a row created earlier in the same failed unit of work.
    /// Compensation path only; committed investments are never deleted.
    async fn remove(&self, id: Uuid) -> Result<(), StoreError>;
}

/// Append-only ledger
#[async_trait]
pub trait LedgerStore: Send + Sync {
    async fn append(&self, entry: &LedgerEntry) -> Result<(), StoreError>;

    async fn find_by_investment(
        &self,
        investment_id: Uuid,
    ) -> Result<Vec<LedgerEntry>, StoreError>;

    /// Remove a row created earlier in the same failed unit of work.
    /// Compensation path only.
    async fn remove(&self, id: Uuid) -> Result<(), StoreError>;
}

/// Marketplace listing persistence
#[async_trait]
pub trait ListingStore: Send + Sync {
    async fn find(&self, id: Uuid) -> Result<Option<MarketplaceListing>, StoreError>;

    async fn insert(&self, listing: &MarketplaceListing) -> Result<(), StoreError>;

    async fn update(&self, listing: &MarketplaceListing) -> Result<(), StoreError>;

    /// The active listing for an investment, if one exists. At most one
    /// listing per investment may be active at a time.
    async fn find_active_by_investment(
        &self,
        investment_id: Uuid,
    ) -> Result<Option<MarketplaceListing>, StoreError>;
}

/// Marketplace sale persistence (insert-only)
#[async_trait]
pub trait SaleStore: Send + Sync {
    async fn insert(&self, sale: &MarketplaceSale) -> Result<(), StoreError>;

    async fn find_by_listing(
        &self,
        listing_id: Uuid,
    ) -> Result<Vec<MarketplaceSale>, StoreError>;
}
