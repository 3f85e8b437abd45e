//! Campaign Engine
//!
//! Drives the campaign lifecycle. Transitions are validated by the
//! aggregate itself; this engine persists the result and publishes the
//! status-change event once the write has committed.

use std::sync::Arc;

use chrono::Utc;
use uuid::Uuid;

use crate::aggregate::{Campaign, CampaignStatus};
use crate::domain::{DomainError, EventPublisher};
use crate::error::AppResult;
use crate::store::CampaignStore;

pub struct CampaignEngine {
    campaigns: Arc<dyn CampaignStore>,
    publisher: Arc<dyn EventPublisher>,
}

impl CampaignEngine {
    pub fn new(campaigns: Arc<dyn CampaignStore>, publisher: Arc<dyn EventPublisher>) -> Self {
        Self {
            campaigns,
            publisher,
        }
    }

    /// Move a campaign to `target`, enforcing the lifecycle graph
    pub async fn transition(
        &self,
        campaign_id: Uuid,
        target: CampaignStatus,
        triggered_by: Uuid,
    ) -> AppResult<Campaign> {
        let mut campaign = self
            .campaigns
            .find(campaign_id)
            .await?
            .ok_or_else(|| DomainError::not_found("Campaign", campaign_id))?;

        let event = campaign.transition(target, triggered_by)?;
        campaign.updated_at = Utc::now();

        self.campaigns.update(&campaign).await?;
        self.publisher.publish(event);

        tracing::info!(
            campaign_id = %campaign.id,
            status = %campaign.status,
            %triggered_by,
            "campaign status changed"
        );

        Ok(campaign)
    }

    /// Look up a single campaign
    pub async fn get_campaign(&self, campaign_id: Uuid) -> AppResult<Campaign> {
        self.campaigns
            .find(campaign_id)
            .await?
            .ok_or_else(|| DomainError::not_found("Campaign", campaign_id).into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    use crate::domain::{CollectingPublisher, DomainEvent};
    use crate::store::MemoryStore;

    async fn fixture() -> (CampaignEngine, Arc<MemoryStore>, Arc<CollectingPublisher>, Campaign) {
        let store = Arc::new(MemoryStore::new());
        let publisher = Arc::new(CollectingPublisher::new());
        let engine = CampaignEngine::new(store.clone(), publisher.clone());

        let campaign = Campaign::new(
            Uuid::new_v4(),
            Uuid::new_v4(),
            dec!(1000000),
            dec!(1000),
            None,
            dec!(100),
            10000,
        );
        CampaignStore::insert(store.as_ref(), &campaign).await.unwrap();

        (engine, store, publisher, campaign)
    }

    #[tokio::test]
    async fn test_transition_persists_and_publishes() {
        let (engine, store, publisher, campaign) = fixture().await;
        let admin = Uuid::new_v4();

        let updated = engine
            .transition(campaign.id, CampaignStatus::Review, admin)
            .await
            .unwrap();
        assert_eq!(updated.status, CampaignStatus::Review);

        let stored = CampaignStore::find(store.as_ref(), campaign.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.status, CampaignStatus::Review);

        let events = publisher.events();
        assert_eq!(events.len(), 1);
        match &events[0] {
            DomainEvent::CampaignStatusChanged {
                campaign_id,
                old_status,
                new_status,
                triggered_by,
            } => {
                assert_eq!(*campaign_id, campaign.id);
                assert_eq!(*old_status, CampaignStatus::Draft);
                assert_eq!(*new_status, CampaignStatus::Review);
                assert_eq!(*triggered_by, admin);
            }
            other => panic!("unexpected event: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_illegal_transition_publishes_nothing() {
        let (engine, store, publisher, campaign) = fixture().await;

        let err = engine
            .transition(campaign.id, CampaignStatus::Funded, Uuid::new_v4())
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Cannot transition from DRAFT to FUNDED");

        let stored = CampaignStore::find(store.as_ref(), campaign.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.status, CampaignStatus::Draft);
        assert!(publisher.is_empty());
    }

    #[tokio::test]
    async fn test_same_status_rejected() {
        let (engine, _, publisher, campaign) = fixture().await;

        let err = engine
            .transition(campaign.id, CampaignStatus::Draft, Uuid::new_v4())
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Campaign is already in DRAFT status");
        assert!(publisher.is_empty());
    }

    #[tokio::test]
    async fn test_unknown_campaign() {
        let (engine, _, _, _) = fixture().await;

        let err = engine
            .transition(Uuid::new_v4(), CampaignStatus::Review, Uuid::new_v4())
            .await
            .unwrap_err();
        assert!(err.to_string().starts_with("Campaign not found"));
    }
}
