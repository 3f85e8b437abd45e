//! Aggregate module
//!
//! Domain entities of the transaction engine. The campaign is the only
//! aggregate with shared mutable state (guarded by its version token); the
//! other entities are owned exclusively by the operation that creates or
//! transitions them.

pub mod campaign;
pub mod investment;
pub mod investor;
pub mod ledger;
pub mod marketplace;

pub use campaign::{Campaign, CampaignDelta, CampaignStatus};
pub use investment::{Investment, InvestmentStatus, PaymentMethod};
pub use investor::{Investor, KycStatus};
pub use ledger::{LedgerEntry, LedgerEntryType};
pub use marketplace::{ListingStatus, MarketplaceListing, MarketplaceSale, SaleStatus};
