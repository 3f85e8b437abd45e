//! Engine Commands
//!
//! Input to the engine operations, decoupled from the HTTP request types.

use rust_decimal::Decimal;
use uuid::Uuid;

use crate::aggregate::PaymentMethod;

/// Command to create a primary investment against a campaign
#[derive(Debug, Clone)]
pub struct CreateInvestmentCommand {
    pub campaign_id: Uuid,
    pub amount: Decimal,
    pub payment_method: PaymentMethod,
}

impl CreateInvestmentCommand {
    pub fn new(campaign_id: Uuid, amount: Decimal, payment_method: PaymentMethod) -> Self {
        Self {
            campaign_id,
            amount,
            payment_method,
        }
    }
}

/// Command to list owned shares for resale
#[derive(Debug, Clone)]
pub struct CreateListingCommand {
    pub investment_id: Uuid,
    pub shares_listed: i64,
    pub price_per_share: Decimal,
    pub company_consent: bool,
}

impl CreateListingCommand {
    pub fn new(investment_id: Uuid, shares_listed: i64, price_per_share: Decimal) -> Self {
        Self {
            investment_id,
            shares_listed,
            price_per_share,
            company_consent: false,
        }
    }

    pub fn with_company_consent(mut self) -> Self {
        self.company_consent = true;
        self
    }
}
