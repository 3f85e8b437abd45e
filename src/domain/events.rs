//! Domain Events
//!
//! Events emitted by the engines once all state mutations for an operation
//! have succeeded. Delivered through the injected [`EventPublisher`] port and
//! consumed by notification/audit subsystems outside this core.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::sync::Mutex;
use uuid::Uuid;

use crate::aggregate::CampaignStatus;

/// Lifecycle and transaction events published by the engines
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum DomainEvent {
    /// A campaign moved to a new lifecycle status
    CampaignStatusChanged {
        campaign_id: Uuid,
        old_status: CampaignStatus,
        new_status: CampaignStatus,
        triggered_by: Uuid,
    },

    /// A primary investment was created against a campaign
    InvestmentCreated {
        investor_id: Uuid,
        campaign_id: Uuid,
        amount: Decimal,
    },

    /// Shares were listed for resale on the secondary marketplace
    ListingCreated { seller_id: Uuid, shares_listed: i64 },
}

impl DomainEvent {
    /// Get the event type as a string
    pub fn event_type(&self) -> &'static str {
        match self {
            DomainEvent::CampaignStatusChanged { .. } => "CampaignStatusChanged",
            DomainEvent::InvestmentCreated { .. } => "InvestmentCreated",
            DomainEvent::ListingCreated { .. } => "ListingCreated",
        }
    }
}

/// Port through which the engines hand events to the outside world.
///
/// Implementations must not fail: event delivery happens after the
/// operation's state mutations have committed, so a publisher that needs
/// reliability has to queue internally.
pub trait EventPublisher: Send + Sync {
    fn publish(&self, event: DomainEvent);
}

/// Publisher that logs events through tracing. Used by the server binary;
/// downstream consumers tail the structured log stream.
#[derive(Debug, Default)]
pub struct TracingPublisher;

impl EventPublisher for TracingPublisher {
    fn publish(&self, event: DomainEvent) {
        tracing::info!(event_type = event.event_type(), event = ?event, "domain event");
    }
}

/// Publisher that collects events in memory. Used in tests and embeddings
/// that want to inspect what an operation emitted.
#[derive(Debug, Default)]
pub struct CollectingPublisher {
    events: Mutex<Vec<DomainEvent>>,
}

impl CollectingPublisher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of all events published so far
    pub fn events(&self) -> Vec<DomainEvent> {
        self.events.lock().expect("publisher lock poisoned").clone()
    }

    /// Number of events published so far
    pub fn len(&self) -> usize {
        self.events.lock().expect("publisher lock poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl EventPublisher for CollectingPublisher {
    fn publish(&self, event: DomainEvent) {
        self.events
            .lock()
            .expect("publisher lock poisoned")
            .push(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_event_serialization() {
        let event = DomainEvent::InvestmentCreated {
            investor_id: Uuid::new_v4(),
            campaign_id: Uuid::new_v4(),
            amount: dec!(10000),
        };

        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("InvestmentCreated"));

        let deserialized: DomainEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(event.event_type(), deserialized.event_type());
    }

    #[test]
    fn test_collecting_publisher() {
        let publisher = CollectingPublisher::new();
        assert!(publisher.is_empty());

        publisher.publish(DomainEvent::ListingCreated {
            seller_id: Uuid::new_v4(),
            shares_listed: 100,
        });

        assert_eq!(publisher.len(), 1);
        assert_eq!(publisher.events()[0].event_type(), "ListingCreated");
    }
}
