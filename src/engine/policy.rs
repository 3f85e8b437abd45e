//! Validation Policies
//!
//! External collaborators consumed by the engines. The engines delegate the
//! eligibility rule sets to these ports and propagate their failures
//! verbatim; the standard implementations below carry the platform's
//! default rules.

use async_trait::async_trait;
use chrono::{Duration, Utc};
use rust_decimal::Decimal;

use crate::aggregate::{Campaign, CampaignStatus, Investment, InvestmentStatus, Investor};
use crate::domain::DomainError;

/// Eligibility rules for a primary investment. Owns the rule set; the
/// engine only supplies the inputs.
#[async_trait]
pub trait InvestmentValidator: Send + Sync {
    async fn validate(
        &self,
        investor: &Investor,
        campaign: &Campaign,
        amount: Decimal,
        has_existing_investment: bool,
    ) -> Result<(), DomainError>;
}

/// Default investment eligibility rules
#[derive(Debug, Default)]
pub struct StandardInvestmentValidator;

#[async_trait]
impl InvestmentValidator for StandardInvestmentValidator {
    async fn validate(
        &self,
        investor: &Investor,
        campaign: &Campaign,
        amount: Decimal,
        has_existing_investment: bool,
    ) -> Result<(), DomainError> {
        if campaign.status != CampaignStatus::Live {
            return Err(DomainError::business_rule(
                "Campaign is not accepting investments",
            ));
        }

        if !investor.is_kyc_approved() {
            return Err(DomainError::business_rule(
                "KYC verification must be approved before investing",
            ));
        }

        if amount < campaign.min_investment {
            return Err(DomainError::business_rule(format!(
                "Investment amount is below the campaign minimum of {}",
                campaign.min_investment
            )));
        }

        if let Some(max) = campaign.max_investment {
            if amount > max {
                return Err(DomainError::business_rule(format!(
                    "Investment amount exceeds the campaign maximum of {max}"
                )));
            }
        }

        if has_existing_investment {
            return Err(DomainError::business_rule(
                "You have already invested in this campaign",
            ));
        }

        Ok(())
    }
}

/// Listing eligibility and fee rules for the secondary marketplace
#[async_trait]
pub trait MarketplacePolicy: Send + Sync {
    /// Holding-period and consent rules for a new listing
    async fn validate_listing(
        &self,
        investment: &Investment,
        company_consent: bool,
    ) -> Result<(), DomainError>;

    /// The platform's cut of a sale at the given total price
    fn seller_fee(&self, total_price: Decimal) -> Decimal;
}

/// Default marketplace rules: a minimum holding period after completion,
/// mandatory company consent, and a basis-point fee on the total price.
#[derive(Debug)]
pub struct StandardMarketplacePolicy {
    min_holding_days: i64,
    fee_basis_points: i64,
}

impl StandardMarketplacePolicy {
    pub fn new(min_holding_days: i64, fee_basis_points: i64) -> Self {
        Self {
            min_holding_days,
            fee_basis_points,
        }
    }
}

impl Default for StandardMarketplacePolicy {
    fn default() -> Self {
        Self::new(180, 200)
    }
}

#[async_trait]
impl MarketplacePolicy for StandardMarketplacePolicy {
    async fn validate_listing(
        &self,
        investment: &Investment,
        company_consent: bool,
    ) -> Result<(), DomainError> {
        if investment.status != InvestmentStatus::Completed {
            return Err(DomainError::business_rule(
                "Only completed investments can be listed for resale",
            ));
        }

        let completed_at = investment.completed_at.ok_or_else(|| {
            DomainError::business_rule("Only completed investments can be listed for resale")
        })?;

        if Utc::now() < completed_at + Duration::days(self.min_holding_days) {
            return Err(DomainError::business_rule(format!(
                "Shares must be held for at least {} days before resale",
                self.min_holding_days
            )));
        }

        if !company_consent {
            return Err(DomainError::business_rule(
                "Company consent is required to list shares on the secondary market",
            ));
        }

        Ok(())
    }

    fn seller_fee(&self, total_price: Decimal) -> Decimal {
        (total_price * Decimal::from(self.fee_basis_points) / Decimal::from(10000)).round_dp(2)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use rust_decimal_macros::dec;
    use uuid::Uuid;

    use crate::aggregate::{KycStatus, PaymentMethod};

    fn live_campaign() -> Campaign {
        let mut campaign = Campaign::new(
            Uuid::new_v4(),
            Uuid::new_v4(),
            dec!(1000000),
            dec!(1000),
            Some(dec!(100000)),
            dec!(100),
            10000,
        );
        campaign.status = CampaignStatus::Live;
        campaign
    }

    fn approved_investor() -> Investor {
        Investor::new(Uuid::new_v4(), "jane@example.com", "Jane Wanjiku")
            .with_kyc(KycStatus::Approved)
    }

    fn held_investment(held_days: i64) -> Investment {
        let mut investment = Investment::new(
            Uuid::new_v4(),
            Uuid::new_v4(),
            dec!(10000),
            100,
            dec!(100),
            PaymentMethod::Mpesa,
            Utc::now(),
        );
        investment.status = InvestmentStatus::Completed;
        investment.completed_at = Some(Utc::now() - Duration::days(held_days));
        investment
    }

    #[tokio::test]
    async fn test_validator_accepts_eligible_investment() {
        let validator = StandardInvestmentValidator;
        let result = validator
            .validate(&approved_investor(), &live_campaign(), dec!(10000), false)
            .await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_validator_rejects_non_live_campaign() {
        let mut campaign = live_campaign();
        campaign.status = CampaignStatus::Funded;

        let err = StandardInvestmentValidator
            .validate(&approved_investor(), &campaign, dec!(10000), false)
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Campaign is not accepting investments");
    }

    #[tokio::test]
    async fn test_validator_rejects_unapproved_kyc() {
        let investor =
            Investor::new(Uuid::new_v4(), "jane@example.com", "Jane").with_kyc(KycStatus::Pending);

        let err = StandardInvestmentValidator
            .validate(&investor, &live_campaign(), dec!(10000), false)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("KYC"));
    }

    #[tokio::test]
    async fn test_validator_enforces_bounds() {
        let validator = StandardInvestmentValidator;
        let campaign = live_campaign();
        let investor = approved_investor();

        let err = validator
            .validate(&investor, &campaign, dec!(500), false)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("below the campaign minimum"));

        let err = validator
            .validate(&investor, &campaign, dec!(200000), false)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("exceeds the campaign maximum"));
    }

    #[tokio::test]
    async fn test_validator_rejects_duplicate_investment() {
        let err = StandardInvestmentValidator
            .validate(&approved_investor(), &live_campaign(), dec!(10000), true)
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "You have already invested in this campaign");
    }

    #[tokio::test]
    async fn test_policy_rejects_incomplete_investment() {
        let policy = StandardMarketplacePolicy::default();
        let mut investment = held_investment(365);
        investment.status = InvestmentStatus::Pending;

        let err = policy.validate_listing(&investment, true).await.unwrap_err();
        assert_eq!(
            err.to_string(),
            "Only completed investments can be listed for resale"
        );
    }

    #[tokio::test]
    async fn test_policy_enforces_holding_period() {
        let policy = StandardMarketplacePolicy::default();
        let investment = held_investment(30);

        let err = policy.validate_listing(&investment, true).await.unwrap_err();
        assert_eq!(
            err.to_string(),
            "Shares must be held for at least 180 days before resale"
        );
    }

    #[tokio::test]
    async fn test_policy_requires_company_consent() {
        let policy = StandardMarketplacePolicy::default();
        let investment = held_investment(365);

        let err = policy.validate_listing(&investment, false).await.unwrap_err();
        assert!(err.to_string().contains("Company consent is required"));

        assert!(policy.validate_listing(&investment, true).await.is_ok());
    }

    #[test]
    fn test_seller_fee_basis_points() {
        let policy = StandardMarketplacePolicy::default();
        assert_eq!(policy.seller_fee(dec!(10000)), dec!(200));
        assert_eq!(policy.seller_fee(dec!(12345.67)), dec!(246.91));
    }
}
