/// 메모리 저장소
/// 하나의 Mutex 로 모든 변경을 직렬화하므로 commit_bid / delete_bid 의 검사와 쓰기가 원자적이다.
// region:    --- Imports
use super::{AuctionStore, BidCommit, BidDeletion, CommitOutcome, DeleteOutcome, StoreError};
use crate::auction::lifecycle::EffectiveState;
use crate::auction::model::{Auction, AuctionId, AuctionStatus, Bid, BidId, NewAuction, UserId};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::{BTreeMap, HashSet};
use tokio::sync::Mutex;
use tracing::debug;

// endregion: --- Imports

#[derive(Default)]
struct MemoryState {
    auctions: BTreeMap<AuctionId, Auction>,
    bids: BTreeMap<BidId, Bid>,
    next_auction_id: AuctionId,
    next_bid_id: BidId,
}

impl MemoryState {
    fn bidder_count(&self, auction_id: AuctionId) -> i64 {
        self.bids
            .values()
            .filter(|bid| bid.auction_id == auction_id)
            .map(|bid| bid.bidder_id)
            .collect::<HashSet<_>>()
            .len() as i64
    }
}

#[derive(Default)]
pub struct MemoryStore {
    state: Mutex<MemoryState>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl AuctionStore for MemoryStore {
    async fn create_auction(
        &self,
        new: NewAuction,
        created_at: DateTime<Utc>,
    ) -> Result<Auction, StoreError> {
        let mut state = self.state.lock().await;
        state.next_auction_id += 1;
        let auction = Auction {
            id: state.next_auction_id,
            title: new.title,
            description: new.description,
            category: new.category,
            condition: new.condition,
            starting_bid: new.starting_bid,
            current_bid: None,
            reserve_price: new.reserve_price,
            bid_increment: new.bid_increment,
            start_time: new.start_time,
            end_time: new.end_time,
            status: new.status,
            bid_count: 0,
            bidder_count: 0,
            created_at,
        };
        state.auctions.insert(auction.id, auction.clone());
        Ok(auction)
    }

    async fn get_auction(&self, id: AuctionId) -> Result<Option<Auction>, StoreError> {
        Ok(self.state.lock().await.auctions.get(&id).cloned())
    }

    async fn list_auctions(&self) -> Result<Vec<Auction>, StoreError> {
        let state = self.state.lock().await;
        let mut auctions: Vec<Auction> = state.auctions.values().cloned().collect();
        auctions.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(auctions)
    }

    async fn delete_auction(&self, id: AuctionId) -> Result<bool, StoreError> {
        let mut state = self.state.lock().await;
        if state.auctions.remove(&id).is_none() {
            return Ok(false);
        }
        state.bids.retain(|_, bid| bid.auction_id != id);
        Ok(true)
    }

    async fn update_status(
        &self,
        id: AuctionId,
        from: AuctionStatus,
        to: AuctionStatus,
    ) -> Result<bool, StoreError> {
        let mut state = self.state.lock().await;
        match state.auctions.get_mut(&id) {
            Some(auction) if auction.status == from => {
                auction.status = to;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn sync_statuses(&self, now: DateTime<Utc>) -> Result<u64, StoreError> {
        let mut state = self.state.lock().await;
        let mut changed = 0;
        for auction in state.auctions.values_mut() {
            let next = match (auction.status, auction.effective_state(now)) {
                (AuctionStatus::Upcoming, EffectiveState::Active) => AuctionStatus::Active,
                (AuctionStatus::Upcoming | AuctionStatus::Active, EffectiveState::Ended) => {
                    AuctionStatus::Ended
                }
                _ => continue,
            };
            auction.status = next;
            changed += 1;
        }
        Ok(changed)
    }

    async fn get_bid(&self, id: BidId) -> Result<Option<Bid>, StoreError> {
        Ok(self.state.lock().await.bids.get(&id).cloned())
    }

    async fn list_bids(&self, auction_id: AuctionId) -> Result<Vec<Bid>, StoreError> {
        let state = self.state.lock().await;
        let mut bids: Vec<Bid> = state
            .bids
            .values()
            .filter(|bid| bid.auction_id == auction_id)
            .cloned()
            .collect();
        bids.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(bids)
    }

    async fn commit_bid(&self, commit: BidCommit) -> Result<CommitOutcome, StoreError> {
        let mut state = self.state.lock().await;

        let Some(current) = state.auctions.get(&commit.auction_id) else {
            return Ok(CommitOutcome::Missing);
        };
        if current.status == AuctionStatus::Cancelled
            || current.end_time.is_some_and(|end| end <= commit.placed_at)
        {
            return Ok(CommitOutcome::Closed(current.clone()));
        }
        if current.current_bid != commit.expected_current_bid {
            debug!(
                "{:<12} --> 현재가 변경 감지: 예상 {:?}, 실제 {:?}",
                "MemoryStore", commit.expected_current_bid, current.current_bid
            );
            return Ok(CommitOutcome::FloorMoved(current.clone()));
        }

        state.next_bid_id += 1;
        let bid = Bid {
            id: state.next_bid_id,
            auction_id: commit.auction_id,
            bidder_id: commit.bidder_id,
            amount: commit.amount,
            created_at: commit.placed_at,
        };
        state.bids.insert(bid.id, bid.clone());

        let bidder_count = state.bidder_count(commit.auction_id);
        let Some(auction) = state.auctions.get_mut(&commit.auction_id) else {
            return Ok(CommitOutcome::Missing);
        };
        auction.current_bid = Some(commit.amount);
        auction.bid_count += 1;
        auction.bidder_count = bidder_count;

        Ok(CommitOutcome::Committed {
            bid,
            auction: auction.clone(),
        })
    }

    async fn delete_bid(&self, deletion: BidDeletion) -> Result<DeleteOutcome, StoreError> {
        let mut state = self.state.lock().await;

        let Some(bid) = state.bids.get(&deletion.bid_id).cloned() else {
            return Ok(DeleteOutcome::Missing);
        };
        if bid.bidder_id != deletion.bidder_id {
            return Ok(DeleteOutcome::NotOwned);
        }
        let Some(auction) = state.auctions.get(&bid.auction_id) else {
            return Ok(DeleteOutcome::Missing);
        };
        let effective = auction.effective_state(deletion.requested_at);
        if !effective.is_active() {
            return Ok(DeleteOutcome::Closed(effective));
        }
        if auction.current_bid.map_or(true, |highest| bid.amount >= highest) {
            return Ok(DeleteOutcome::IsHighest);
        }

        state.bids.remove(&bid.id);
        let bidder_count = state.bidder_count(bid.auction_id);
        let Some(auction) = state.auctions.get_mut(&bid.auction_id) else {
            return Ok(DeleteOutcome::Missing);
        };
        auction.bid_count -= 1;
        auction.bidder_count = bidder_count;

        Ok(DeleteOutcome::Deleted {
            bid,
            auction: auction.clone(),
        })
    }

    async fn latest_win_at(
        &self,
        bidder_id: UserId,
        now: DateTime<Utc>,
    ) -> Result<Option<DateTime<Utc>>, StoreError> {
        let state = self.state.lock().await;
        let won_at = state
            .auctions
            .values()
            .filter(|auction| auction.status != AuctionStatus::Cancelled)
            .filter_map(|auction| {
                let end = auction.end_time.filter(|end| *end <= now)?;
                let highest = auction.current_bid?;
                state
                    .bids
                    .values()
                    .any(|bid| {
                        bid.auction_id == auction.id
                            && bid.bidder_id == bidder_id
                            && bid.amount == highest
                    })
                    .then_some(end)
            })
            .max();
        Ok(won_at)
    }
}
