/// 경매/입찰 저장소
/// current_bid 는 commit_bid 의 조건부 갱신으로만 변경된다.
// region:    --- Imports
use crate::auction::lifecycle::EffectiveState;
use crate::auction::model::{Auction, AuctionId, AuctionStatus, Bid, BidId, NewAuction, UserId};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

pub mod memory;
pub mod postgres;
pub mod queries;

pub use memory::MemoryStore;
pub use postgres::PostgresStore;

// endregion: --- Imports

// region:    --- Store Types
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum StoreError {
    #[error("데이터베이스 오류: {0}")]
    Unavailable(String),

    #[error("잘못된 저장 데이터: {0}")]
    Corrupt(String),
}

impl From<sqlx::Error> for StoreError {
    fn from(e: sqlx::Error) -> Self {
        StoreError::Unavailable(e.to_string())
    }
}

/// 입찰 커밋 요청
/// expected_current_bid 는 검증 시점에 읽은 current_bid 값이다.
#[derive(Debug, Clone)]
pub struct BidCommit {
    pub auction_id: AuctionId,
    pub bidder_id: UserId,
    pub amount: Decimal,
    pub expected_current_bid: Option<Decimal>,
    pub placed_at: DateTime<Utc>,
}

/// 입찰 커밋 결과
#[derive(Debug, Clone, PartialEq)]
pub enum CommitOutcome {
    Committed { bid: Bid, auction: Auction },
    /// 다른 입찰이 먼저 현재가를 올렸다
    FloorMoved(Auction),
    /// 그 사이 경매가 취소되었거나 종료되었다
    Closed(Auction),
    Missing,
}

#[derive(Debug, Clone)]
pub struct BidDeletion {
    pub bid_id: BidId,
    pub bidder_id: UserId,
    pub requested_at: DateTime<Utc>,
}

/// 입찰 삭제 결과
#[derive(Debug, Clone, PartialEq)]
pub enum DeleteOutcome {
    Deleted { bid: Bid, auction: Auction },
    Missing,
    NotOwned,
    Closed(EffectiveState),
    IsHighest,
}
// endregion: --- Store Types

// region:    --- Auction Store Trait
#[async_trait]
pub trait AuctionStore: Send + Sync {
    async fn create_auction(
        &self,
        new: NewAuction,
        created_at: DateTime<Utc>,
    ) -> Result<Auction, StoreError>;

    async fn get_auction(&self, id: AuctionId) -> Result<Option<Auction>, StoreError>;

    async fn list_auctions(&self) -> Result<Vec<Auction>, StoreError>;

    /// 경매 삭제 (입찰도 함께 삭제)
    async fn delete_auction(&self, id: AuctionId) -> Result<bool, StoreError>;

    /// 저장된 상태가 from 일 때만 to 로 변경
    async fn update_status(
        &self,
        id: AuctionId,
        from: AuctionStatus,
        to: AuctionStatus,
    ) -> Result<bool, StoreError>;

    /// 저장된 상태 힌트를 입찰 기간에 맞춘다. draft, cancelled 는 건드리지 않는다.
    async fn sync_statuses(&self, now: DateTime<Utc>) -> Result<u64, StoreError>;

    async fn get_bid(&self, id: BidId) -> Result<Option<Bid>, StoreError>;

    /// 경매의 입찰 목록 (최신순)
    async fn list_bids(&self, auction_id: AuctionId) -> Result<Vec<Bid>, StoreError>;

    /// 입찰 추가와 현재가 갱신을 하나의 원자적 조건부 갱신으로 수행
    async fn commit_bid(&self, commit: BidCommit) -> Result<CommitOutcome, StoreError>;

    /// 최고 입찰이 아닌 경우에만 입찰 삭제 (조건은 커밋 시점에 재확인)
    async fn delete_bid(&self, deletion: BidDeletion) -> Result<DeleteOutcome, StoreError>;

    /// now 이전에 종료된 경매 중 입찰자가 낙찰받은 가장 최근 종료 시각
    async fn latest_win_at(
        &self,
        bidder_id: UserId,
        now: DateTime<Utc>,
    ) -> Result<Option<DateTime<Utc>>, StoreError>;
}
// endregion: --- Auction Store Trait
