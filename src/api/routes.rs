//! API Routes
//!
//! HTTP endpoint definitions.

use std::sync::Arc;

use axum::{
    extract::{Extension, Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::aggregate::{
    Campaign, CampaignStatus, Investment, MarketplaceListing, MarketplaceSale, PaymentMethod,
};
use crate::domain::OperationContext;
use crate::engine::{
    CampaignEngine, CreateInvestmentCommand, CreateListingCommand, InvestmentEngine,
    MarketplaceEngine,
};
use crate::error::AppError;

use super::middleware::RequestUser;

/// Shared application state: the three engines
#[derive(Clone)]
pub struct AppState {
    pub campaigns: Arc<CampaignEngine>,
    pub investments: Arc<InvestmentEngine>,
    pub marketplace: Arc<MarketplaceEngine>,
}

// =========================================================================
// Request/Response types
// =========================================================================

#[derive(Debug, Deserialize)]
pub struct TransitionRequest {
    pub target_status: CampaignStatus,
}

#[derive(Debug, Serialize)]
pub struct CampaignResponse {
    pub id: Uuid,
    pub issuer_id: Uuid,
    pub status: CampaignStatus,
    pub target_amount: Decimal,
    pub raised_amount: Decimal,
    pub share_price: Decimal,
    pub total_shares: i64,
    pub sold_shares: i64,
    pub investor_count: i32,
    pub version: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Campaign> for CampaignResponse {
    fn from(c: Campaign) -> Self {
        Self {
            id: c.id,
            issuer_id: c.issuer_id,
            status: c.status,
            target_amount: c.target_amount,
            raised_amount: c.raised_amount,
            share_price: c.share_price,
            total_shares: c.total_shares,
            sold_shares: c.sold_shares,
            investor_count: c.investor_count,
            version: c.version,
            created_at: c.created_at,
            updated_at: c.updated_at,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct CreateInvestmentRequest {
    pub campaign_id: Uuid,
    pub amount: String,
    pub payment_method: PaymentMethod,
}

#[derive(Debug, Serialize)]
pub struct InvestmentResponse {
    pub id: Uuid,
    pub investor_id: Uuid,
    pub campaign_id: Uuid,
    pub amount: Decimal,
    pub shares: i64,
    pub share_price: Decimal,
    pub status: String,
    pub payment_method: PaymentMethod,
    pub cooling_off_expires_at: DateTime<Utc>,
    pub cancelled_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl From<Investment> for InvestmentResponse {
    fn from(i: Investment) -> Self {
        Self {
            id: i.id,
            investor_id: i.investor_id,
            campaign_id: i.campaign_id,
            amount: i.amount,
            shares: i.shares,
            share_price: i.share_price,
            status: i.status.to_string(),
            payment_method: i.payment_method,
            cooling_off_expires_at: i.cooling_off_expires_at,
            cancelled_at: i.cancelled_at,
            completed_at: i.completed_at,
            created_at: i.created_at,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct CreateListingRequest {
    pub investment_id: Uuid,
    pub shares: i64,
    pub price_per_share: String,
    #[serde(default)]
    pub company_consent: bool,
}

#[derive(Debug, Serialize)]
pub struct ListingResponse {
    pub id: Uuid,
    pub seller_id: Uuid,
    pub investment_id: Uuid,
    pub campaign_id: Uuid,
    pub shares_listed: i64,
    pub price_per_share: Decimal,
    pub total_price: Decimal,
    pub seller_fee: Decimal,
    pub net_amount: Decimal,
    pub status: String,
    pub buyer_id: Option<Uuid>,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl From<MarketplaceListing> for ListingResponse {
    fn from(l: MarketplaceListing) -> Self {
        Self {
            id: l.id,
            seller_id: l.seller_id,
            investment_id: l.investment_id,
            campaign_id: l.campaign_id,
            shares_listed: l.shares_listed,
            price_per_share: l.price_per_share,
            total_price: l.total_price,
            seller_fee: l.seller_fee,
            net_amount: l.net_amount(),
            status: l.status.to_string(),
            buyer_id: l.buyer_id,
            expires_at: l.expires_at,
            created_at: l.created_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct SaleResponse {
    pub id: Uuid,
    pub listing_id: Uuid,
    pub buyer_id: Uuid,
    pub seller_id: Uuid,
    pub shares: i64,
    pub total_amount: Decimal,
    pub seller_fee: Decimal,
    pub net_amount: Decimal,
    pub status: String,
    pub created_at: DateTime<Utc>,
}

impl From<MarketplaceSale> for SaleResponse {
    fn from(s: MarketplaceSale) -> Self {
        Self {
            id: s.id,
            listing_id: s.listing_id,
            buyer_id: s.buyer_id,
            seller_id: s.seller_id,
            shares: s.shares,
            total_amount: s.total_amount,
            seller_fee: s.seller_fee,
            net_amount: s.net_amount,
            status: s.status.to_string(),
            created_at: s.created_at,
        }
    }
}

// =========================================================================
// API Router
// =========================================================================

/// Create the API router
pub fn create_router() -> Router<AppState> {
    Router::new()
        // Campaign lifecycle
        .route("/campaigns/:campaign_id", get(get_campaign))
        .route("/campaigns/:campaign_id/transition", post(transition_campaign))
        // Primary investments
        .route("/investments", post(create_investment))
        .route("/investments/:investment_id", get(get_investment))
        .route("/investments/:investment_id/cancel", post(cancel_investment))
        .route("/investments/:investment_id/complete", post(complete_investment))
        // Secondary marketplace
        .route("/listings", post(create_listing))
        .route("/listings/:listing_id", get(get_listing))
        .route("/listings/:listing_id/cancel", post(cancel_listing))
        .route("/listings/:listing_id/buy", post(buy_listing))
}

/// X-Request-User-Id is mandatory on mutating endpoints. Binds the caller
/// into the operation context and emits the operation log line.
fn require_user(
    context: OperationContext,
    user: Option<Extension<RequestUser>>,
    operation: &'static str,
) -> Result<Uuid, AppError> {
    let user_id = user
        .map(|Extension(u)| u.user_id)
        .ok_or_else(|| AppError::MissingHeader("X-Request-User-Id".to_string()))?;

    let context = context.with_request_user(user_id);
    tracing::debug!(
        operation,
        user_id = %user_id,
        correlation_id = ?context.correlation_id,
        "handling request"
    );

    Ok(user_id)
}

fn parse_amount(raw: &str, field: &str) -> Result<Decimal, AppError> {
    let amount: crate::domain::Amount = raw
        .parse()
        .map_err(|e| AppError::InvalidRequest(format!("Invalid {field}: {e}")))?;
    Ok(amount.value())
}

// =========================================================================
// Campaign endpoints
// =========================================================================

/// Get campaign by ID
async fn get_campaign(
    State(state): State<AppState>,
    Path(campaign_id): Path<Uuid>,
) -> Result<Json<CampaignResponse>, AppError> {
    let campaign = state.campaigns.get_campaign(campaign_id).await?;
    Ok(Json(campaign.into()))
}

/// Move a campaign through its lifecycle
async fn transition_campaign(
    State(state): State<AppState>,
    Path(campaign_id): Path<Uuid>,
    Extension(context): Extension<OperationContext>,
    request_user: Option<Extension<RequestUser>>,
    Json(request): Json<TransitionRequest>,
) -> Result<Json<CampaignResponse>, AppError> {
    let user_id = require_user(context, request_user, "transition_campaign")?;

    let campaign = state
        .campaigns
        .transition(campaign_id, request.target_status, user_id)
        .await?;

    Ok(Json(campaign.into()))
}

// =========================================================================
// Investment endpoints
// =========================================================================

/// Invest in a live campaign
async fn create_investment(
    State(state): State<AppState>,
    Extension(context): Extension<OperationContext>,
    request_user: Option<Extension<RequestUser>>,
    Json(request): Json<CreateInvestmentRequest>,
) -> Result<(StatusCode, Json<InvestmentResponse>), AppError> {
    let user_id = require_user(context, request_user, "create_investment")?;
    let amount = parse_amount(&request.amount, "amount")?;

    let command =
        CreateInvestmentCommand::new(request.campaign_id, amount, request.payment_method);
    let investment = state.investments.create_investment(user_id, command).await?;

    Ok((StatusCode::CREATED, Json(investment.into())))
}

/// Get investment by ID
async fn get_investment(
    State(state): State<AppState>,
    Path(investment_id): Path<Uuid>,
) -> Result<Json<InvestmentResponse>, AppError> {
    let investment = state.investments.get_investment(investment_id).await?;
    Ok(Json(investment.into()))
}

/// Cancel an investment during the cooling-off window
async fn cancel_investment(
    State(state): State<AppState>,
    Path(investment_id): Path<Uuid>,
    Extension(context): Extension<OperationContext>,
    request_user: Option<Extension<RequestUser>>,
) -> Result<Json<InvestmentResponse>, AppError> {
    let user_id = require_user(context, request_user, "cancel_investment")?;

    let investment = state
        .investments
        .cancel_investment(investment_id, user_id)
        .await?;

    Ok(Json(investment.into()))
}

/// Mark an investment's payment as settled
async fn complete_investment(
    State(state): State<AppState>,
    Path(investment_id): Path<Uuid>,
) -> Result<Json<InvestmentResponse>, AppError> {
    let investment = state.investments.complete_investment(investment_id).await?;
    Ok(Json(investment.into()))
}

// =========================================================================
// Marketplace endpoints
// =========================================================================

/// List shares for resale
async fn create_listing(
    State(state): State<AppState>,
    Extension(context): Extension<OperationContext>,
    request_user: Option<Extension<RequestUser>>,
    Json(request): Json<CreateListingRequest>,
) -> Result<(StatusCode, Json<ListingResponse>), AppError> {
    let user_id = require_user(context, request_user, "create_listing")?;
    let price_per_share = parse_amount(&request.price_per_share, "price_per_share")?;

    let command =
        CreateListingCommand::new(request.investment_id, request.shares, price_per_share);
    let command = if request.company_consent {
        command.with_company_consent()
    } else {
        command
    };

    let listing = state.marketplace.create_listing(user_id, command).await?;

    Ok((StatusCode::CREATED, Json(listing.into())))
}

/// Get listing by ID
async fn get_listing(
    State(state): State<AppState>,
    Path(listing_id): Path<Uuid>,
) -> Result<Json<ListingResponse>, AppError> {
    let listing = state.marketplace.get_listing(listing_id).await?;
    Ok(Json(listing.into()))
}

/// Cancel an active listing
async fn cancel_listing(
    State(state): State<AppState>,
    Path(listing_id): Path<Uuid>,
    Extension(context): Extension<OperationContext>,
    request_user: Option<Extension<RequestUser>>,
) -> Result<Json<ListingResponse>, AppError> {
    let user_id = require_user(context, request_user, "cancel_listing")?;

    let listing = state.marketplace.cancel_listing(listing_id, user_id).await?;
    Ok(Json(listing.into()))
}

/// Buy an active listing
async fn buy_listing(
    State(state): State<AppState>,
    Path(listing_id): Path<Uuid>,
    Extension(context): Extension<OperationContext>,
    request_user: Option<Extension<RequestUser>>,
) -> Result<(StatusCode, Json<SaleResponse>), AppError> {
    let user_id = require_user(context, request_user, "buy_listing")?;

    let sale = state.marketplace.buy_listing(listing_id, user_id).await?;
    Ok((StatusCode::CREATED, Json(sale.into())))
}
