// region:    --- Imports
use crate::auction::admin::{AdminError, AuctionAdmin};
use crate::auction::model::{AuctionId, AuctionStatus, AuctionView, BidId, NewAuction, UserId};
use crate::auth;
use crate::bidding::commands::{BiddingService, PlaceBidCommand};
use crate::bidding::error::BidError;
use crate::bidding::retry::{self, RetryPolicy};
use crate::bidding::validator::BidCheck;
use crate::clock::Clock;
use crate::store::AuctionStore;
use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{delete, get, post};
use axum::{Json, Router};
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use tracing::info;

// endregion: --- Imports

// region:    --- App State
#[derive(Clone)]
pub struct AppState {
    pub bidding: Arc<BiddingService>,
    pub admin: Arc<AuctionAdmin>,
    pub store: Arc<dyn AuctionStore>,
    pub clock: Arc<dyn Clock>,
    pub retry: RetryPolicy,
}

/// 라우터 설정
pub fn routes(state: AppState) -> Router {
    Router::new()
        .route(
            "/auctions",
            get(handle_list_auctions).post(handle_create_auction),
        )
        .route(
            "/auctions/:id",
            get(handle_get_auction).delete(handle_delete_auction),
        )
        .route("/auctions/:id/status", post(handle_transition_status))
        .route(
            "/auctions/:id/bids",
            get(handle_get_bids).post(handle_place_bid),
        )
        .route("/auctions/:id/bids/check", post(handle_check_bid))
        .route("/bids/:id", delete(handle_cancel_bid))
        .route("/bidders/:id/can-bid", get(handle_can_bid))
        .with_state(state)
}
// endregion: --- App State

// region:    --- Requests
#[derive(Debug, Deserialize)]
pub struct BidRequest {
    pub amount: Decimal,
}

#[derive(Debug, Deserialize)]
pub struct StatusRequest {
    pub status: AuctionStatus,
}
// endregion: --- Requests

// region:    --- Error Responses
impl IntoResponse for BidError {
    fn into_response(self) -> Response {
        let status = match &self {
            BidError::Unauthenticated => StatusCode::UNAUTHORIZED,
            BidError::BiddingRestricted { .. } | BidError::NotOwned => StatusCode::FORBIDDEN,
            BidError::AuctionNotActive { .. } | BidError::CannotCancelHighestBid => {
                StatusCode::BAD_REQUEST
            }
            BidError::InvalidAmount { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            BidError::Conflict { .. } => StatusCode::CONFLICT,
            BidError::NotFound => StatusCode::NOT_FOUND,
            BidError::StoreUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        };

        let mut body = json!({
            "error": self.to_string(),
            "code": self.code(),
        });
        if let Some(min_next) = self.min_next() {
            body["min_next"] = json!(min_next);
        }
        if let BidError::BiddingRestricted { until } = &self {
            body["restricted_until"] = json!(until);
        }
        if let BidError::AuctionNotActive { state: Some(state) } = &self {
            body["state"] = json!(state);
        }

        (status, Json(body)).into_response()
    }
}

impl IntoResponse for AdminError {
    fn into_response(self) -> Response {
        let status = match &self {
            AdminError::Unauthenticated => StatusCode::UNAUTHORIZED,
            AdminError::Forbidden => StatusCode::FORBIDDEN,
            AdminError::NotFound => StatusCode::NOT_FOUND,
            AdminError::InvalidAuction(_) | AdminError::InvalidTransition { .. } => {
                StatusCode::BAD_REQUEST
            }
            AdminError::Conflict => StatusCode::CONFLICT,
            AdminError::StoreUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        };
        (
            status,
            Json(json!({
                "error": self.to_string(),
                "code": self.code(),
            })),
        )
            .into_response()
    }
}
// endregion: --- Error Responses

// region:    --- Command Handlers

/// 입찰 요청 처리
pub async fn handle_place_bid(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(auction_id): Path<AuctionId>,
    Json(req): Json<BidRequest>,
) -> Response {
    let caller = auth::current_user(&headers).map(|user| user.id);
    let cmd = PlaceBidCommand {
        auction_id,
        amount: req.amount,
    };

    let service = Arc::clone(&state.bidding);
    let result = retry::with_backoff(state.retry, || {
        let service = Arc::clone(&service);
        let cmd = cmd.clone();
        async move { service.place_bid(caller, cmd).await }
    })
    .await;

    match result {
        Ok(receipt) => (
            StatusCode::OK,
            Json(json!({
                "message": "입찰이 성공적으로 처리되었습니다.",
                "bid_id": receipt.bid_id,
                "auction_id": receipt.auction_id,
                "current_bid": receipt.current_bid,
                "min_next": receipt.min_next,
                "bid_count": receipt.bid_count,
                "bidder_count": receipt.bidder_count,
            })),
        )
            .into_response(),
        Err(e) => e.into_response(),
    }
}

/// 입찰 취소 요청 처리
pub async fn handle_cancel_bid(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(bid_id): Path<BidId>,
) -> Response {
    let caller = auth::current_user(&headers).map(|user| user.id);

    let service = Arc::clone(&state.bidding);
    let result = retry::with_backoff(state.retry, || {
        let service = Arc::clone(&service);
        async move { service.cancel_bid(caller, bid_id).await }
    })
    .await;

    match result {
        Ok(receipt) => (
            StatusCode::OK,
            Json(json!({
                "message": "입찰이 취소되었습니다.",
                "bid_id": receipt.bid_id,
                "auction_id": receipt.auction_id,
                "bid_count": receipt.bid_count,
                "bidder_count": receipt.bidder_count,
            })),
        )
            .into_response(),
        Err(e) => e.into_response(),
    }
}

/// 입찰 금액 사전 확인
pub async fn handle_check_bid(
    State(state): State<AppState>,
    Path(auction_id): Path<AuctionId>,
    Json(req): Json<BidRequest>,
) -> Response {
    match state.bidding.check_bid(auction_id, req.amount).await {
        Ok(BidCheck::Valid) => Json(json!({ "valid": true })).into_response(),
        Ok(BidCheck::Invalid { reason, min_next }) => Json(json!({
            "valid": false,
            "reason": reason.to_string(),
            "code": reason,
            "min_next": min_next,
        }))
        .into_response(),
        Err(e) => e.into_response(),
    }
}

/// 경매 생성
pub async fn handle_create_auction(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(new): Json<NewAuction>,
) -> Response {
    let caller = auth::current_user(&headers);
    match state.admin.create_auction(caller.as_ref(), new).await {
        Ok(auction) => {
            let view = AuctionView::new(auction, state.clock.now());
            (StatusCode::CREATED, Json(view)).into_response()
        }
        Err(e) => e.into_response(),
    }
}

/// 경매 상태 전환
pub async fn handle_transition_status(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(auction_id): Path<AuctionId>,
    Json(req): Json<StatusRequest>,
) -> Response {
    let caller = auth::current_user(&headers);
    match state
        .admin
        .transition_status(caller.as_ref(), auction_id, req.status)
        .await
    {
        Ok(auction) => Json(AuctionView::new(auction, state.clock.now())).into_response(),
        Err(e) => e.into_response(),
    }
}

/// 경매 삭제
pub async fn handle_delete_auction(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(auction_id): Path<AuctionId>,
) -> Response {
    let caller = auth::current_user(&headers);
    match state.admin.delete_auction(caller.as_ref(), auction_id).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => e.into_response(),
    }
}

// endregion: --- Command Handlers

// region:    --- Query Handlers

/// 모든 경매 조회 (lifecycle 평가 포함)
pub async fn handle_list_auctions(State(state): State<AppState>) -> Response {
    info!("{:<12} --> 모든 경매 조회", "HandlerQuery");
    match state.store.list_auctions().await {
        Ok(auctions) => {
            let now = state.clock.now();
            let views: Vec<AuctionView> = auctions
                .into_iter()
                .map(|auction| AuctionView::new(auction, now))
                .collect();
            Json(views).into_response()
        }
        Err(e) => BidError::from(e).into_response(),
    }
}

/// 경매 조회
pub async fn handle_get_auction(
    State(state): State<AppState>,
    Path(auction_id): Path<AuctionId>,
) -> Response {
    info!("{:<12} --> 경매 조회 id: {}", "HandlerQuery", auction_id);
    match state.store.get_auction(auction_id).await {
        Ok(Some(auction)) => Json(AuctionView::new(auction, state.clock.now())).into_response(),
        Ok(None) => AdminError::NotFound.into_response(),
        Err(e) => BidError::from(e).into_response(),
    }
}

/// 경매 입찰 이력 조회
pub async fn handle_get_bids(
    State(state): State<AppState>,
    Path(auction_id): Path<AuctionId>,
) -> Response {
    info!("{:<12} --> 입찰 이력 조회 id: {}", "HandlerQuery", auction_id);
    match state.store.list_bids(auction_id).await {
        Ok(bids) => Json(bids).into_response(),
        Err(e) => BidError::from(e).into_response(),
    }
}

/// 입찰 가능 여부 조회
pub async fn handle_can_bid(
    State(state): State<AppState>,
    Path(user_id): Path<UserId>,
) -> Response {
    info!("{:<12} --> 입찰 가능 여부 조회 id: {}", "HandlerQuery", user_id);
    match state.bidding.restricted_until(user_id).await {
        Ok(until) => Json(json!({
            "user_id": user_id,
            "can_bid": until.is_none(),
            "restricted_until": until,
        }))
        .into_response(),
        Err(e) => e.into_response(),
    }
}

// endregion: --- Query Handlers
