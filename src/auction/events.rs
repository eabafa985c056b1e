use super::model::{AuctionId, AuctionStatus, BidId, UserId};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub enum AuctionEvent {
    // 입찰 확정으로 현재가 상승
    FloorAdvanced {
        auction_id: AuctionId,
        bid_id: BidId,
        bidder_id: UserId,
        amount: Decimal,
        min_next: Decimal,
        bid_count: i64,
        timestamp: DateTime<Utc>,
    },
    // 입찰 취소
    BidCancelled {
        auction_id: AuctionId,
        bid_id: BidId,
        bidder_id: UserId,
        timestamp: DateTime<Utc>,
    },
    // 관리자 상태 변경
    StatusChanged {
        auction_id: AuctionId,
        from: AuctionStatus,
        to: AuctionStatus,
        timestamp: DateTime<Utc>,
    },
}

impl AuctionEvent {
    pub fn auction_id(&self) -> AuctionId {
        match self {
            AuctionEvent::FloorAdvanced { auction_id, .. }
            | AuctionEvent::BidCancelled { auction_id, .. }
            | AuctionEvent::StatusChanged { auction_id, .. } => *auction_id,
        }
    }

    pub fn event_type(&self) -> &'static str {
        match self {
            AuctionEvent::FloorAdvanced { .. } => "FloorAdvanced",
            AuctionEvent::BidCancelled { .. } => "BidCancelled",
            AuctionEvent::StatusChanged { .. } => "StatusChanged",
        }
    }
}
