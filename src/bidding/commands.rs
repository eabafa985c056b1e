/// 입찰 관련 커맨드 처리
/// 1. 입찰 (유일하게 current_bid 를 올릴 수 있는 경로)
/// 2. 입찰 취소
/// 3. 입찰 금액 사전 확인 / 입찰 가능 여부 확인
// region:    --- Imports
use super::cooldown::CooldownGate;
use super::error::BidError;
use super::validator::{validate_bid, BidCheck};
use crate::auction::events::AuctionEvent;
use crate::auction::model::{AuctionId, Bid, BidId, UserId};
use crate::audit::{self, AuditEvent, AuditLog};
use crate::clock::Clock;
use crate::event_bus::{self, BidEventPublisher};
use crate::store::{AuctionStore, BidCommit, BidDeletion, CommitOutcome, DeleteOutcome};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, warn};

// endregion: --- Imports

// region:    --- Commands
/// 입찰 명령
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct PlaceBidCommand {
    pub auction_id: AuctionId,
    pub amount: Decimal,
}

/// 입찰 성공 결과
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BidReceipt {
    pub bid_id: BidId,
    pub auction_id: AuctionId,
    pub current_bid: Decimal,
    pub min_next: Decimal,
    pub bid_count: i64,
    pub bidder_count: i64,
}

/// 입찰 취소 결과
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CancelReceipt {
    pub bid_id: BidId,
    pub auction_id: AuctionId,
    pub bid_count: i64,
    pub bidder_count: i64,
}

const ACTION_PLACE_BID: &str = "bid.place";
const ACTION_CANCEL_BID: &str = "bid.cancel";
// endregion: --- Commands

// region:    --- Bidding Service
pub struct BiddingService {
    store: Arc<dyn AuctionStore>,
    clock: Arc<dyn Clock>,
    cooldown: CooldownGate,
    audit: Arc<dyn AuditLog>,
    publisher: Arc<dyn BidEventPublisher>,
}

impl BiddingService {
    pub fn new(
        store: Arc<dyn AuctionStore>,
        clock: Arc<dyn Clock>,
        audit: Arc<dyn AuditLog>,
        publisher: Arc<dyn BidEventPublisher>,
    ) -> Self {
        Self {
            store,
            clock,
            cooldown: CooldownGate::default(),
            audit,
            publisher,
        }
    }

    pub fn with_cooldown(mut self, cooldown: CooldownGate) -> Self {
        self.cooldown = cooldown;
        self
    }

    /// 1. 입찰
    pub async fn place_bid(
        &self,
        caller: Option<UserId>,
        cmd: PlaceBidCommand,
    ) -> Result<BidReceipt, BidError> {
        info!(
            "{:<12} --> 입찰 요청 처리 시작: {:?} (bidder {:?})",
            "Command", cmd, caller
        );
        let now = self.clock.now();
        let result = self.try_place_bid(caller, &cmd, now).await;

        match &result {
            Ok(receipt) => {
                info!(
                    "{:<12} --> 입찰 성공: auction {} 현재가 {}",
                    "Command", receipt.auction_id, receipt.current_bid
                );
                audit::dispatch(
                    &self.audit,
                    AuditEvent::success(ACTION_PLACE_BID, "auction", cmd.auction_id, caller, now)
                        .for_auction(Some(cmd.auction_id)),
                );
                event_bus::dispatch(
                    &self.publisher,
                    AuctionEvent::FloorAdvanced {
                        auction_id: receipt.auction_id,
                        bid_id: receipt.bid_id,
                        bidder_id: caller.unwrap_or_default(),
                        amount: receipt.current_bid,
                        min_next: receipt.min_next,
                        bid_count: receipt.bid_count,
                        timestamp: now,
                    },
                );
            }
            Err(e) => {
                warn!(
                    "{:<12} --> 입찰 거절 auction {}: {} ({})",
                    "Command",
                    cmd.auction_id,
                    e.code(),
                    e
                );
                audit::dispatch(
                    &self.audit,
                    AuditEvent::failure(
                        ACTION_PLACE_BID,
                        "auction",
                        cmd.auction_id,
                        caller,
                        e.code(),
                        e.to_string(),
                        now,
                    )
                    .for_auction(Some(cmd.auction_id)),
                );
            }
        }

        result
    }

    async fn try_place_bid(
        &self,
        caller: Option<UserId>,
        cmd: &PlaceBidCommand,
        now: DateTime<Utc>,
    ) -> Result<BidReceipt, BidError> {
        // 인증 확인
        let bidder_id = caller.ok_or(BidError::Unauthenticated)?;

        // 낙찰 후 입찰 제한 확인
        if let Some(until) = self
            .cooldown
            .restricted_until(self.store.as_ref(), bidder_id, now)
            .await?
        {
            return Err(BidError::BiddingRestricted { until });
        }

        // 경매 상태 확인
        let auction = self
            .store
            .get_auction(cmd.auction_id)
            .await?
            .ok_or(BidError::AuctionNotActive { state: None })?;
        let state = auction.effective_state(now);
        if !state.is_active() {
            return Err(BidError::AuctionNotActive { state: Some(state) });
        }

        // 방금 읽은 현재가 기준으로 금액 검증
        if let BidCheck::Invalid { reason, min_next } =
            validate_bid(cmd.amount, auction.floor(), auction.bid_increment)
        {
            return Err(BidError::InvalidAmount { reason, min_next });
        }

        // 읽은 현재가가 그대로일 때만 커밋
        let outcome = self
            .store
            .commit_bid(BidCommit {
                auction_id: auction.id,
                bidder_id,
                amount: cmd.amount,
                expected_current_bid: auction.current_bid,
                placed_at: now,
            })
            .await?;

        match outcome {
            CommitOutcome::Committed { bid, auction } => Ok(BidReceipt {
                bid_id: bid.id,
                auction_id: auction.id,
                current_bid: auction.floor(),
                min_next: auction.min_next(),
                bid_count: auction.bid_count,
                bidder_count: auction.bidder_count,
            }),
            CommitOutcome::FloorMoved(fresh) => {
                warn!(
                    "{:<12} --> 낙관적 갱신 충돌: auction {} 현재가 {}",
                    "Command",
                    fresh.id,
                    fresh.floor()
                );
                Err(BidError::Conflict {
                    min_next: fresh.min_next(),
                })
            }
            CommitOutcome::Closed(fresh) => Err(BidError::AuctionNotActive {
                state: Some(fresh.effective_state(now)),
            }),
            CommitOutcome::Missing => Err(BidError::AuctionNotActive { state: None }),
        }
    }

    /// 2. 입찰 취소
    pub async fn cancel_bid(
        &self,
        caller: Option<UserId>,
        bid_id: BidId,
    ) -> Result<CancelReceipt, BidError> {
        info!(
            "{:<12} --> 입찰 취소 요청: bid {} (bidder {:?})",
            "Command", bid_id, caller
        );
        let now = self.clock.now();
        let target = self.load_cancel_target(caller, bid_id).await;
        let auction_id = target.as_ref().ok().map(|(_, bid)| bid.auction_id);
        let result = match target {
            Ok((bidder_id, bid)) => self.try_cancel_bid(bidder_id, bid, now).await,
            Err(e) => Err(e),
        };

        match &result {
            Ok(receipt) => {
                info!(
                    "{:<12} --> 입찰 취소 성공: bid {} (auction {})",
                    "Command", receipt.bid_id, receipt.auction_id
                );
                audit::dispatch(
                    &self.audit,
                    AuditEvent::success(ACTION_CANCEL_BID, "bid", bid_id, caller, now)
                        .for_auction(auction_id),
                );
                event_bus::dispatch(
                    &self.publisher,
                    AuctionEvent::BidCancelled {
                        auction_id: receipt.auction_id,
                        bid_id: receipt.bid_id,
                        bidder_id: caller.unwrap_or_default(),
                        timestamp: now,
                    },
                );
            }
            Err(e) => {
                warn!(
                    "{:<12} --> 입찰 취소 거절 bid {}: {} ({})",
                    "Command",
                    bid_id,
                    e.code(),
                    e
                );
                audit::dispatch(
                    &self.audit,
                    AuditEvent::failure(
                        ACTION_CANCEL_BID,
                        "bid",
                        bid_id,
                        caller,
                        e.code(),
                        e.to_string(),
                        now,
                    )
                    .for_auction(auction_id),
                );
            }
        }

        result
    }

    /// 취소 대상 입찰 조회 및 소유자 확인
    async fn load_cancel_target(
        &self,
        caller: Option<UserId>,
        bid_id: BidId,
    ) -> Result<(UserId, Bid), BidError> {
        let bidder_id = caller.ok_or(BidError::Unauthenticated)?;
        let bid = self.store.get_bid(bid_id).await?.ok_or(BidError::NotFound)?;
        if bid.bidder_id != bidder_id {
            return Err(BidError::NotOwned);
        }
        Ok((bidder_id, bid))
    }

    async fn try_cancel_bid(
        &self,
        bidder_id: UserId,
        bid: Bid,
        now: DateTime<Utc>,
    ) -> Result<CancelReceipt, BidError> {
        // 사전 확인
        let auction = self
            .store
            .get_auction(bid.auction_id)
            .await?
            .ok_or(BidError::NotFound)?;
        let state = auction.effective_state(now);
        if !state.is_active() {
            return Err(BidError::AuctionNotActive { state: Some(state) });
        }
        if auction
            .current_bid
            .map_or(true, |highest| bid.amount >= highest)
        {
            return Err(BidError::CannotCancelHighestBid);
        }

        // 커밋 시점에 조건 재확인
        let outcome = self
            .store
            .delete_bid(BidDeletion {
                bid_id: bid.id,
                bidder_id,
                requested_at: now,
            })
            .await?;

        match outcome {
            DeleteOutcome::Deleted { bid, auction } => Ok(CancelReceipt {
                bid_id: bid.id,
                auction_id: auction.id,
                bid_count: auction.bid_count,
                bidder_count: auction.bidder_count,
            }),
            DeleteOutcome::Missing => Err(BidError::NotFound),
            DeleteOutcome::NotOwned => Err(BidError::NotOwned),
            DeleteOutcome::Closed(state) => Err(BidError::AuctionNotActive { state: Some(state) }),
            DeleteOutcome::IsHighest => Err(BidError::CannotCancelHighestBid),
        }
    }

    /// 3. 입찰 금액 사전 확인 (참고용, 커밋 시 다시 검증)
    pub async fn check_bid(
        &self,
        auction_id: AuctionId,
        amount: Decimal,
    ) -> Result<BidCheck, BidError> {
        let auction = self
            .store
            .get_auction(auction_id)
            .await?
            .ok_or(BidError::AuctionNotActive { state: None })?;
        Ok(validate_bid(amount, auction.floor(), auction.bid_increment))
    }

    /// 입찰 가능 여부 (낙찰 후 제한 기간 확인)
    pub async fn can_user_bid(&self, user_id: UserId) -> Result<bool, BidError> {
        let now = self.clock.now();
        Ok(self
            .cooldown
            .can_user_bid(self.store.as_ref(), user_id, now)
            .await?)
    }

    /// 제한 해제 시각
    pub async fn restricted_until(
        &self,
        user_id: UserId,
    ) -> Result<Option<DateTime<Utc>>, BidError> {
        let now = self.clock.now();
        Ok(self
            .cooldown
            .restricted_until(self.store.as_ref(), user_id, now)
            .await?)
    }
}
// endregion: --- Bidding Service
