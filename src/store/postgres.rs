/// Postgres 저장소
// region:    --- Imports
use super::{
    queries, AuctionStore, BidCommit, BidDeletion, CommitOutcome, DeleteOutcome, StoreError,
};
use crate::auction::model::{Auction, AuctionId, AuctionStatus, Bid, BidId, NewAuction, UserId};
use crate::database::DatabaseManager;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::FromRow;
use std::sync::Arc;
use tracing::{debug, info};

// endregion: --- Imports

// region:    --- Row Mapping
#[derive(FromRow)]
struct AuctionRow {
    id: i64,
    title: String,
    description: String,
    category: String,
    condition: String,
    starting_bid: Decimal,
    current_bid: Option<Decimal>,
    reserve_price: Option<Decimal>,
    bid_increment: Decimal,
    start_time: Option<DateTime<Utc>>,
    end_time: Option<DateTime<Utc>>,
    status: String,
    bid_count: i64,
    bidder_count: i64,
    created_at: DateTime<Utc>,
}

impl TryFrom<AuctionRow> for Auction {
    type Error = StoreError;

    fn try_from(row: AuctionRow) -> Result<Self, Self::Error> {
        let status = row
            .status
            .parse::<AuctionStatus>()
            .map_err(StoreError::Corrupt)?;
        Ok(Auction {
            id: row.id,
            title: row.title,
            description: row.description,
            category: row.category,
            condition: row.condition,
            starting_bid: row.starting_bid,
            current_bid: row.current_bid,
            reserve_price: row.reserve_price,
            bid_increment: row.bid_increment,
            start_time: row.start_time,
            end_time: row.end_time,
            status,
            bid_count: row.bid_count,
            bidder_count: row.bidder_count,
            created_at: row.created_at,
        })
    }
}
// endregion: --- Row Mapping

// region:    --- Postgres Store
pub struct PostgresStore {
    db: Arc<DatabaseManager>,
}

impl PostgresStore {
    pub fn new(db: Arc<DatabaseManager>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl AuctionStore for PostgresStore {
    async fn create_auction(
        &self,
        new: NewAuction,
        created_at: DateTime<Utc>,
    ) -> Result<Auction, StoreError> {
        let row = sqlx::query_as::<_, AuctionRow>(queries::INSERT_AUCTION)
            .bind(&new.title)
            .bind(&new.description)
            .bind(&new.category)
            .bind(&new.condition)
            .bind(new.starting_bid)
            .bind(new.reserve_price)
            .bind(new.bid_increment)
            .bind(new.start_time)
            .bind(new.end_time)
            .bind(new.status.as_str())
            .bind(created_at)
            .fetch_one(&*self.db.pool)
            .await?;
        let auction = Auction::try_from(row)?;
        info!("{:<12} --> 경매 생성 id: {}", "PgStore", auction.id);
        Ok(auction)
    }

    async fn get_auction(&self, id: AuctionId) -> Result<Option<Auction>, StoreError> {
        let row = self
            .db
            .transaction(|tx| {
                Box::pin(async move {
                    sqlx::query_as::<_, AuctionRow>(queries::GET_AUCTION)
                        .bind(id)
                        .fetch_optional(&mut **tx)
                        .await
                })
            })
            .await?;
        row.map(Auction::try_from).transpose()
    }

    async fn list_auctions(&self) -> Result<Vec<Auction>, StoreError> {
        let rows = self
            .db
            .transaction(|tx| {
                Box::pin(async move {
                    sqlx::query_as::<_, AuctionRow>(queries::GET_ALL_AUCTIONS)
                        .fetch_all(&mut **tx)
                        .await
                })
            })
            .await?;
        rows.into_iter().map(Auction::try_from).collect()
    }

    async fn delete_auction(&self, id: AuctionId) -> Result<bool, StoreError> {
        let result = sqlx::query(queries::DELETE_AUCTION)
            .bind(id)
            .execute(&*self.db.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn update_status(
        &self,
        id: AuctionId,
        from: AuctionStatus,
        to: AuctionStatus,
    ) -> Result<bool, StoreError> {
        let result = sqlx::query(queries::UPDATE_STATUS)
            .bind(id)
            .bind(from.as_str())
            .bind(to.as_str())
            .execute(&*self.db.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn sync_statuses(&self, now: DateTime<Utc>) -> Result<u64, StoreError> {
        let activated = sqlx::query(queries::SYNC_UPCOMING_TO_ACTIVE)
            .bind(now)
            .execute(&*self.db.pool)
            .await?
            .rows_affected();
        let ended = sqlx::query(queries::SYNC_TO_ENDED)
            .bind(now)
            .execute(&*self.db.pool)
            .await?
            .rows_affected();
        Ok(activated + ended)
    }

    async fn get_bid(&self, id: BidId) -> Result<Option<Bid>, StoreError> {
        let bid = self
            .db
            .transaction(|tx| {
                Box::pin(async move {
                    sqlx::query_as::<_, Bid>(queries::GET_BID)
                        .bind(id)
                        .fetch_optional(&mut **tx)
                        .await
                })
            })
            .await?;
        Ok(bid)
    }

    async fn list_bids(&self, auction_id: AuctionId) -> Result<Vec<Bid>, StoreError> {
        let bids = self
            .db
            .transaction(|tx| {
                Box::pin(async move {
                    sqlx::query_as::<_, Bid>(queries::GET_AUCTION_BIDS)
                        .bind(auction_id)
                        .fetch_all(&mut **tx)
                        .await
                })
            })
            .await?;
        Ok(bids)
    }

    async fn commit_bid(&self, commit: BidCommit) -> Result<CommitOutcome, StoreError> {
        // 트랜잭션 시작
        let mut tx = self.db.pool.begin().await?;

        // 현재가 조건부 갱신
        let advanced = sqlx::query_as::<_, AuctionRow>(queries::ADVANCE_FLOOR)
            .bind(commit.auction_id)
            .bind(commit.amount)
            .bind(commit.expected_current_bid)
            .bind(commit.placed_at)
            .fetch_optional(&mut *tx)
            .await?;

        let Some(row) = advanced else {
            // 실패 사유 판별을 위해 최신 상태 조회 후 롤백
            let fresh = sqlx::query_as::<_, AuctionRow>(queries::GET_AUCTION)
                .bind(commit.auction_id)
                .fetch_optional(&mut *tx)
                .await?;
            tx.rollback().await?;

            let Some(fresh) = fresh else {
                return Ok(CommitOutcome::Missing);
            };
            let auction = Auction::try_from(fresh)?;
            debug!(
                "{:<12} --> 조건부 갱신 실패 id: {}, 현재가 {:?}",
                "PgStore", auction.id, auction.current_bid
            );
            let closed = auction.status == AuctionStatus::Cancelled
                || auction.end_time.is_some_and(|end| end <= commit.placed_at);
            return Ok(if closed {
                CommitOutcome::Closed(auction)
            } else {
                CommitOutcome::FloorMoved(auction)
            });
        };

        // 입찰 기록 추가
        let bid = sqlx::query_as::<_, Bid>(queries::INSERT_BID)
            .bind(commit.auction_id)
            .bind(commit.bidder_id)
            .bind(commit.amount)
            .bind(commit.placed_at)
            .fetch_one(&mut *tx)
            .await?;

        let bidder_count = sqlx::query_scalar::<_, i64>(queries::REFRESH_BIDDER_COUNT)
            .bind(commit.auction_id)
            .fetch_one(&mut *tx)
            .await?;

        // 트랜잭션 커밋
        tx.commit().await?;

        let mut auction = Auction::try_from(row)?;
        auction.bidder_count = bidder_count;
        Ok(CommitOutcome::Committed { bid, auction })
    }

    async fn delete_bid(&self, deletion: BidDeletion) -> Result<DeleteOutcome, StoreError> {
        let mut tx = self.db.pool.begin().await?;

        let Some(bid) = sqlx::query_as::<_, Bid>(queries::GET_BID)
            .bind(deletion.bid_id)
            .fetch_optional(&mut *tx)
            .await?
        else {
            tx.rollback().await?;
            return Ok(DeleteOutcome::Missing);
        };
        if bid.bidder_id != deletion.bidder_id {
            tx.rollback().await?;
            return Ok(DeleteOutcome::NotOwned);
        }

        // 경매 행 잠금 후 최고 입찰 여부 재확인
        let Some(row) = sqlx::query_as::<_, AuctionRow>(queries::GET_AUCTION_FOR_UPDATE)
            .bind(bid.auction_id)
            .fetch_optional(&mut *tx)
            .await?
        else {
            tx.rollback().await?;
            return Ok(DeleteOutcome::Missing);
        };
        let auction = Auction::try_from(row)?;

        let effective = auction.effective_state(deletion.requested_at);
        if !effective.is_active() {
            tx.rollback().await?;
            return Ok(DeleteOutcome::Closed(effective));
        }
        if auction
            .current_bid
            .map_or(true, |highest| bid.amount >= highest)
        {
            tx.rollback().await?;
            return Ok(DeleteOutcome::IsHighest);
        }

        let deleted = sqlx::query(queries::DELETE_BID)
            .bind(bid.id)
            .execute(&mut *tx)
            .await?
            .rows_affected();
        if deleted == 0 {
            tx.rollback().await?;
            return Ok(DeleteOutcome::Missing);
        }

        sqlx::query(queries::DECREMENT_BID_COUNT)
            .bind(bid.auction_id)
            .execute(&mut *tx)
            .await?;
        let bidder_count = sqlx::query_scalar::<_, i64>(queries::REFRESH_BIDDER_COUNT)
            .bind(bid.auction_id)
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;

        let mut auction = auction;
        auction.bid_count -= 1;
        auction.bidder_count = bidder_count;
        Ok(DeleteOutcome::Deleted { bid, auction })
    }

    async fn latest_win_at(
        &self,
        bidder_id: UserId,
        now: DateTime<Utc>,
    ) -> Result<Option<DateTime<Utc>>, StoreError> {
        let won_at = sqlx::query_scalar::<_, Option<DateTime<Utc>>>(queries::GET_LATEST_WIN)
            .bind(bidder_id)
            .bind(now)
            .fetch_one(&*self.db.pool)
            .await?;
        Ok(won_at)
    }
}
// endregion: --- Postgres Store
