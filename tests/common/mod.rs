//! Shared test harness
//!
//! Wires the three engines to an in-memory store so the full flows run
//! without a database.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use uuid::Uuid;

use equifund::aggregate::{
    Campaign, CampaignDelta, CampaignStatus, Investment, InvestmentStatus, Investor, KycStatus,
    PaymentMethod,
};
use equifund::domain::CollectingPublisher;
use equifund::engine::{
    CampaignEngine, InvestmentEngine, MarketplaceEngine, StandardInvestmentValidator,
    StandardMarketplacePolicy,
};
use equifund::store::{CampaignStore, InvestmentStore, InvestorStore, MemoryStore, StoreError};

pub struct TestApp {
    pub store: Arc<MemoryStore>,
    pub publisher: Arc<CollectingPublisher>,
    pub campaigns: CampaignEngine,
    pub investments: InvestmentEngine,
    pub marketplace: MarketplaceEngine,
}

impl TestApp {
    pub fn new() -> Self {
        let store = Arc::new(MemoryStore::new());
        let publisher = Arc::new(CollectingPublisher::new());

        let campaigns = CampaignEngine::new(store.clone(), publisher.clone());

        let investments = InvestmentEngine::new(
            store.clone(),
            store.clone(),
            store.clone(),
            store.clone(),
            Arc::new(StandardInvestmentValidator),
            publisher.clone(),
            48,
        );

        let marketplace = MarketplaceEngine::new(
            store.clone(),
            store.clone(),
            store.clone(),
            Arc::new(StandardMarketplacePolicy::new(180, 200)),
            publisher.clone(),
            30,
        );

        Self {
            store,
            publisher,
            campaigns,
            investments,
            marketplace,
        }
    }

    /// Seed a KYC-approved investor
    pub async fn seed_investor(&self) -> Investor {
        let investor = Investor::new(Uuid::new_v4(), "jane@example.com", "Jane Wanjiku")
            .with_kyc(KycStatus::Approved);
        InvestorStore::insert(self.store.as_ref(), &investor)
            .await
            .unwrap();
        investor
    }

    /// Seed a LIVE campaign with share price 100 and minimum 10
    pub async fn seed_live_campaign(&self) -> Campaign {
        self.seed_campaign(CampaignStatus::Live, dec!(100), dec!(10))
            .await
    }

    pub async fn seed_campaign(
        &self,
        status: CampaignStatus,
        share_price: Decimal,
        min_investment: Decimal,
    ) -> Campaign {
        let mut campaign = Campaign::new(
            Uuid::new_v4(),
            Uuid::new_v4(),
            dec!(1000000),
            min_investment,
            None,
            share_price,
            10000,
        );
        campaign.status = status;
        CampaignStore::insert(self.store.as_ref(), &campaign)
            .await
            .unwrap();
        campaign
    }

    /// Seed an investment completed long enough ago to clear the default
    /// holding period
    pub async fn seed_resellable_investment(&self, investor_id: Uuid, campaign_id: Uuid) -> Investment {
        let mut investment = Investment::new(
            investor_id,
            campaign_id,
            dec!(10000),
            100,
            dec!(100),
            PaymentMethod::Mpesa,
            Utc::now(),
        );
        investment.status = InvestmentStatus::Completed;
        investment.completed_at = Some(Utc::now() - chrono::Duration::days(365));
        InvestmentStore::insert(self.store.as_ref(), &investment)
            .await
            .unwrap();
        investment
    }
}

/// Campaign store whose conditional update always reports a stale version,
/// simulating a concurrent writer winning every race
pub struct ConflictingCampaignStore {
    pub inner: Arc<MemoryStore>,
}

#[async_trait]
impl CampaignStore for ConflictingCampaignStore {
    async fn find(&self, id: Uuid) -> Result<Option<Campaign>, StoreError> {
        CampaignStore::find(self.inner.as_ref(), id).await
    }

    async fn insert(&self, campaign: &Campaign) -> Result<(), StoreError> {
        CampaignStore::insert(self.inner.as_ref(), campaign).await
    }

    async fn update(&self, campaign: &Campaign) -> Result<(), StoreError> {
        CampaignStore::update(self.inner.as_ref(), campaign).await
    }

    async fn apply_delta(
        &self,
        _id: Uuid,
        _expected_version: i64,
        _delta: &CampaignDelta,
    ) -> Result<bool, StoreError> {
        Ok(false)
    }
}
