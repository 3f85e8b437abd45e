//! Engines
//!
//! The three operation surfaces of the platform: campaign lifecycle,
//! primary investments and the secondary marketplace. Engines orchestrate
//! the aggregates through the storage ports and publish domain events
//! after the writes commit.

pub mod campaign;
pub mod commands;
pub mod investment;
pub mod marketplace;
pub mod policy;

pub use campaign::CampaignEngine;
pub use commands::{CreateInvestmentCommand, CreateListingCommand};
pub use investment::InvestmentEngine;
pub use marketplace::MarketplaceEngine;
pub use policy::{
    InvestmentValidator, MarketplacePolicy, StandardInvestmentValidator, StandardMarketplacePolicy,
};
