//! Postgres store
//!
//! sqlx-backed implementation of the storage ports. The campaign's
//! conditional update is a single `UPDATE ... WHERE id = $1 AND version = $2`
//! statement; a zero-row result surfaces as `Ok(false)` and the engine turns
//! it into the concurrency-conflict business error.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use crate::aggregate::{
    Campaign, CampaignDelta, Investment, Investor, LedgerEntry, MarketplaceListing,
    MarketplaceSale, SaleStatus,
};

use super::{
    CampaignStore, InvestmentStore, InvestorStore, LedgerStore, ListingStore, SaleStore,
    StoreError,
};

/// Postgres-backed implementation of every storage port
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

type CampaignRow = (
    Uuid,            // id
    Uuid,            // issuer_id
    String,          // status
    Decimal,         // target_amount
    Decimal,         // min_investment
    Option<Decimal>, // max_investment
    Decimal,         // raised_amount
    Decimal,         // share_price
    i64,             // total_shares
    i64,             // sold_shares
    i32,             // investor_count
    i64,             // version
    bool,            // deleted
    DateTime<Utc>,   // created_at
    DateTime<Utc>,   // updated_at
);

fn campaign_from_row(row: CampaignRow) -> Result<Campaign, StoreError> {
    Ok(Campaign {
        id: row.0,
        issuer_id: row.1,
        status: row.2.parse().map_err(StoreError::invalid_row)?,
        target_amount: row.3,
        min_investment: row.4,
        max_investment: row.5,
        raised_amount: row.6,
        share_price: row.7,
        total_shares: row.8,
        sold_shares: row.9,
        investor_count: row.10,
        version: row.11,
        deleted: row.12,
        created_at: row.13,
        updated_at: row.14,
    })
}

#[async_trait]
impl CampaignStore for PgStore {
    async fn find(&self, id: Uuid) -> Result<Option<Campaign>, StoreError> {
        let row: Option<CampaignRow> = sqlx::query_as(
            r#"
            SELECT id, issuer_id, status, target_amount, min_investment, max_investment,
                   raised_amount, share_price, total_shares, sold_shares, investor_count,
                   version, deleted, created_at, updated_at
            FROM campaigns
            WHERE id = $1 AND deleted = FALSE
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(campaign_from_row).transpose()
    }

    async fn insert(&self, campaign: &Campaign) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO campaigns (
                id, issuer_id, status, target_amount, min_investment, max_investment,
                raised_amount, share_price, total_shares, sold_shares, investor_count,
                version, deleted, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15)
            "#,
        )
        .bind(campaign.id)
        .bind(campaign.issuer_id)
        .bind(campaign.status.as_str())
        .bind(campaign.target_amount)
        .bind(campaign.min_investment)
        .bind(campaign.max_investment)
        .bind(campaign.raised_amount)
        .bind(campaign.share_price)
        .bind(campaign.total_shares)
        .bind(campaign.sold_shares)
        .bind(campaign.investor_count)
        .bind(campaign.version)
        .bind(campaign.deleted)
        .bind(campaign.created_at)
        .bind(campaign.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn update(&self, campaign: &Campaign) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            UPDATE campaigns
            SET status = $2, version = version + 1, updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(campaign.id)
        .bind(campaign.status.as_str())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn apply_delta(
        &self,
        id: Uuid,
        expected_version: i64,
        delta: &CampaignDelta,
    ) -> Result<bool, StoreError> {
        let result = sqlx::query(
            r#"
            UPDATE campaigns
            SET raised_amount = raised_amount + $3,
                sold_shares = sold_shares + $4,
                investor_count = investor_count + $5,
                version = version + 1,
                updated_at = NOW()
            WHERE id = $1 AND version = $2 AND deleted = FALSE
            "#,
        )
        .bind(id)
        .bind(expected_version)
        .bind(delta.amount)
        .bind(delta.shares)
        .bind(delta.investors)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }
}

type InvestorRow = (
    Uuid,          // id
    String,        // email
    String,        // full_name
    String,        // kyc_status
    bool,          // active
    bool,          // deleted
    DateTime<Utc>, // created_at
);

fn investor_from_row(row: InvestorRow) -> Result<Investor, StoreError> {
    Ok(Investor {
        id: row.0,
        email: row.1,
        full_name: row.2,
        kyc_status: row.3.parse().map_err(StoreError::invalid_row)?,
        active: row.4,
        deleted: row.5,
        created_at: row.6,
    })
}

#[async_trait]
impl InvestorStore for PgStore {
    async fn find(&self, id: Uuid) -> Result<Option<Investor>, StoreError> {
        let row: Option<InvestorRow> = sqlx::query_as(
            r#"
            SELECT id, email, full_name, kyc_status, active, deleted, created_at
            FROM investors
            WHERE id = $1 AND deleted = FALSE
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(investor_from_row).transpose()
    }

    async fn insert(&self, investor: &Investor) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO investors (id, email, full_name, kyc_status, active, deleted, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(investor.id)
        .bind(&investor.email)
        .bind(&investor.full_name)
        .bind(investor.kyc_status.as_str())
        .bind(investor.active)
        .bind(investor.deleted)
        .bind(investor.created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

type InvestmentRow = (
    Uuid,                  // id
    Uuid,                  // investor_id
    Uuid,                  // campaign_id
    Decimal,               // amount
    i64,                   // shares
    Decimal,               // share_price
    String,                // payment_method
    String,                // status
    DateTime<Utc>,         // cooling_off_expires_at
    Option<DateTime<Utc>>, // cancelled_at
    Option<DateTime<Utc>>, // completed_at
    Option<String>,        // cancellation_reason
    DateTime<Utc>,         // created_at
);

fn investment_from_row(row: InvestmentRow) -> Result<Investment, StoreError> {
    Ok(Investment {
        id: row.0,
        investor_id: row.1,
        campaign_id: row.2,
        amount: row.3,
        shares: row.4,
        share_price: row.5,
        payment_method: row.6.parse().map_err(StoreError::invalid_row)?,
        status: row.7.parse().map_err(StoreError::invalid_row)?,
        cooling_off_expires_at: row.8,
        cancelled_at: row.9,
        completed_at: row.10,
        cancellation_reason: row.11,
        created_at: row.12,
    })
}

#[async_trait]
impl InvestmentStore for PgStore {
    async fn find(&self, id: Uuid) -> Result<Option<Investment>, StoreError> {
        let row: Option<InvestmentRow> = sqlx::query_as(
            r#"
            SELECT id, investor_id, campaign_id, amount, shares, share_price,
                   payment_method, status, cooling_off_expires_at, cancelled_at,
                   completed_at, cancellation_reason, created_at
            FROM investments
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(investment_from_row).transpose()
    }

    async fn insert(&self, investment: &Investment) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO investments (
                id, investor_id, campaign_id, amount, shares, share_price,
                payment_method, status, cooling_off_expires_at, cancelled_at,
                completed_at, cancellation_reason, created_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
            "#,
        )
        .bind(investment.id)
        .bind(investment.investor_id)
        .bind(investment.campaign_id)
        .bind(investment.amount)
        .bind(investment.shares)
        .bind(investment.share_price)
        .bind(investment.payment_method.as_str())
        .bind(investment.status.as_str())
        .bind(investment.cooling_off_expires_at)
        .bind(investment.cancelled_at)
        .bind(investment.completed_at)
        .bind(&investment.cancellation_reason)
        .bind(investment.created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn update(&self, investment: &Investment) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            UPDATE investments
            SET status = $2, cancelled_at = $3, completed_at = $4, cancellation_reason = $5
            WHERE id = $1
            "#,
        )
        .bind(investment.id)
        .bind(investment.status.as_str())
        .bind(investment.cancelled_at)
        .bind(investment.completed_at)
        .bind(&investment.cancellation_reason)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn exists_live_for(
        &self,
        investor_id: Uuid,
        campaign_id: Uuid,
    ) -> Result<bool, StoreError> {
        let exists: bool = sqlx::query_scalar(
            r#"
            SELECT EXISTS (
                SELECT 1 FROM investments
                WHERE investor_id = $1 AND campaign_id = $2
                  AND status NOT IN ('CANCELLED', 'REFUNDED')
            )
            "#,
        )
        .bind(investor_id)
        .bind(campaign_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(exists)
    }

    async fn remove(&self, id: Uuid) -> Result<(), StoreError> {
        sqlx::query("DELETE FROM investments WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }
}

type LedgerRow = (
    Uuid,          // id
    String,        // entry_type
    Decimal,       // amount
    String,        // currency
    String,        // payment_method
    Uuid,          // investment_id
    DateTime<Utc>, // created_at
);

fn ledger_from_row(row: LedgerRow) -> Result<LedgerEntry, StoreError> {
    Ok(LedgerEntry {
        id: row.0,
        entry_type: row.1.parse().map_err(StoreError::invalid_row)?,
        amount: row.2,
        currency: row.3,
        payment_method: row.4.parse().map_err(StoreError::invalid_row)?,
        investment_id: row.5,
        created_at: row.6,
    })
}

#[async_trait]
impl LedgerStore for PgStore {
    async fn append(&self, entry: &LedgerEntry) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO ledger_entries (
                id, entry_type, amount, currency, payment_method, investment_id, created_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(entry.id)
        .bind(entry.entry_type.as_str())
        .bind(entry.amount)
        .bind(&entry.currency)
        .bind(entry.payment_method.as_str())
        .bind(entry.investment_id)
        .bind(entry.created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn find_by_investment(
        &self,
        investment_id: Uuid,
    ) -> Result<Vec<LedgerEntry>, StoreError> {
        let rows: Vec<LedgerRow> = sqlx::query_as(
            r#"
            SELECT id, entry_type, amount, currency, payment_method, investment_id, created_at
            FROM ledger_entries
            WHERE investment_id = $1
            ORDER BY created_at ASC
            "#,
        )
        .bind(investment_id)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(ledger_from_row).collect()
    }

    async fn remove(&self, id: Uuid) -> Result<(), StoreError> {
        sqlx::query("DELETE FROM ledger_entries WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }
}

type ListingRow = (
    Uuid,                  // id
    Uuid,                  // seller_id
    Uuid,                  // investment_id
    Uuid,                  // campaign_id
    i64,                   // shares_listed
    Decimal,               // price_per_share
    Decimal,               // total_price
    Decimal,               // seller_fee
    String,                // status
    Option<Uuid>,          // buyer_id
    Option<DateTime<Utc>>, // sold_at
    DateTime<Utc>,         // expires_at
    DateTime<Utc>,         // created_at
);

fn listing_from_row(row: ListingRow) -> Result<MarketplaceListing, StoreError> {
    Ok(MarketplaceListing {
        id: row.0,
        seller_id: row.1,
        investment_id: row.2,
        campaign_id: row.3,
        shares_listed: row.4,
        price_per_share: row.5,
        total_price: row.6,
        seller_fee: row.7,
        status: row.8.parse().map_err(StoreError::invalid_row)?,
        buyer_id: row.9,
        sold_at: row.10,
        expires_at: row.11,
        created_at: row.12,
    })
}

const LISTING_COLUMNS: &str = "id, seller_id, investment_id, campaign_id, shares_listed, \
     price_per_share, total_price, seller_fee, status, buyer_id, sold_at, expires_at, created_at";

#[async_trait]
impl ListingStore for PgStore {
    async fn find(&self, id: Uuid) -> Result<Option<MarketplaceListing>, StoreError> {
        let row: Option<ListingRow> = sqlx::query_as(&format!(
            "SELECT {LISTING_COLUMNS} FROM marketplace_listings WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(listing_from_row).transpose()
    }

    async fn insert(&self, listing: &MarketplaceListing) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO marketplace_listings (
                id, seller_id, investment_id, campaign_id, shares_listed,
                price_per_share, total_price, seller_fee, status, buyer_id,
                sold_at, expires_at, created_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
            "#,
        )
        .bind(listing.id)
        .bind(listing.seller_id)
        .bind(listing.investment_id)
        .bind(listing.campaign_id)
        .bind(listing.shares_listed)
        .bind(listing.price_per_share)
        .bind(listing.total_price)
        .bind(listing.seller_fee)
        .bind(listing.status.as_str())
        .bind(listing.buyer_id)
        .bind(listing.sold_at)
        .bind(listing.expires_at)
        .bind(listing.created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn update(&self, listing: &MarketplaceListing) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            UPDATE marketplace_listings
            SET status = $2, buyer_id = $3, sold_at = $4
            WHERE id = $1
            "#,
        )
        .bind(listing.id)
        .bind(listing.status.as_str())
        .bind(listing.buyer_id)
        .bind(listing.sold_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn find_active_by_investment(
        &self,
        investment_id: Uuid,
    ) -> Result<Option<MarketplaceListing>, StoreError> {
        let row: Option<ListingRow> = sqlx::query_as(&format!(
            "SELECT {LISTING_COLUMNS} FROM marketplace_listings \
             WHERE investment_id = $1 AND status = 'ACTIVE'"
        ))
        .bind(investment_id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(listing_from_row).transpose()
    }
}

type SaleRow = (
    Uuid,          // id
    Uuid,          // listing_id
    Uuid,          // buyer_id
    Uuid,          // seller_id
    i64,           // shares
    Decimal,       // total_amount
    Decimal,       // seller_fee
    Decimal,       // net_amount
    DateTime<Utc>, // created_at
);

fn sale_from_row(row: SaleRow) -> MarketplaceSale {
    MarketplaceSale {
        id: row.0,
        listing_id: row.1,
        buyer_id: row.2,
        seller_id: row.3,
        shares: row.4,
        total_amount: row.5,
        seller_fee: row.6,
        net_amount: row.7,
        status: SaleStatus::Completed,
        created_at: row.8,
    }
}

#[async_trait]
impl SaleStore for PgStore {
    async fn insert(&self, sale: &MarketplaceSale) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO marketplace_sales (
                id, listing_id, buyer_id, seller_id, shares,
                total_amount, seller_fee, net_amount, status, created_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            "#,
        )
        .bind(sale.id)
        .bind(sale.listing_id)
        .bind(sale.buyer_id)
        .bind(sale.seller_id)
        .bind(sale.shares)
        .bind(sale.total_amount)
        .bind(sale.seller_fee)
        .bind(sale.net_amount)
        .bind(sale.status.as_str())
        .bind(sale.created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn find_by_listing(
        &self,
        listing_id: Uuid,
    ) -> Result<Vec<MarketplaceSale>, StoreError> {
        let rows: Vec<SaleRow> = sqlx::query_as(
            r#"
            SELECT id, listing_id, buyer_id, seller_id, shares,
                   total_amount, seller_fee, net_amount, created_at
            FROM marketplace_sales
            WHERE listing_id = $1
            ORDER BY created_at ASC
            "#,
        )
        .bind(listing_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(sale_from_row).collect())
    }
}
