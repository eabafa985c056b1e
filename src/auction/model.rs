use super::lifecycle::{self, EffectiveState};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub type AuctionId = i64;
pub type BidId = i64;
pub type UserId = i64;

/// 경매 금액 상한 (시작가, 입찰 단위, 최저 낙찰가, 입찰가)
/// floor + increment 가 Decimal 범위를 넘지 않도록 보장한다.
pub const MAX_AMOUNT: Decimal = Decimal::from_parts(0xA4C6_8000, 0x0003_8D7E, 0, false, 0);

// region:    --- Auction Status
/// 저장된 경매 상태 (힌트 값이며, 실제 입찰 가능 여부는 lifecycle 평가 결과를 따른다)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuctionStatus {
    Draft,
    Upcoming,
    Active,
    Ended,
    Cancelled,
}

impl AuctionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuctionStatus::Draft => "draft",
            AuctionStatus::Upcoming => "upcoming",
            AuctionStatus::Active => "active",
            AuctionStatus::Ended => "ended",
            AuctionStatus::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for AuctionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AuctionStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "draft" => Ok(AuctionStatus::Draft),
            "upcoming" => Ok(AuctionStatus::Upcoming),
            "active" => Ok(AuctionStatus::Active),
            "ended" => Ok(AuctionStatus::Ended),
            "cancelled" => Ok(AuctionStatus::Cancelled),
            other => Err(format!("알 수 없는 경매 상태: {}", other)),
        }
    }
}
// endregion: --- Auction Status

// region:    --- Models
/// 경매 모델
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Auction {
    pub id: AuctionId,
    pub title: String,
    pub description: String,
    pub category: String,
    pub condition: String,
    pub starting_bid: Decimal,
    pub current_bid: Option<Decimal>,
    /// 참고용 메타데이터. 입찰/종료 시점에는 강제하지 않는다.
    pub reserve_price: Option<Decimal>,
    pub bid_increment: Decimal,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
    pub status: AuctionStatus,
    pub bid_count: i64,
    pub bidder_count: i64,
    pub created_at: DateTime<Utc>,
}

impl Auction {
    /// 새 입찰이 넘어야 하는 가격 (current_bid 가 없으면 starting_bid)
    pub fn floor(&self) -> Decimal {
        self.current_bid.unwrap_or(self.starting_bid)
    }

    /// 다음 입찰 최소 금액
    pub fn min_next(&self) -> Decimal {
        self.floor().saturating_add(self.bid_increment)
    }

    pub fn effective_state(&self, now: DateTime<Utc>) -> EffectiveState {
        lifecycle::evaluate(self.start_time, self.end_time, self.status, now)
    }
}

/// 입찰 모델
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Bid {
    pub id: BidId,
    pub auction_id: AuctionId,
    pub bidder_id: UserId,
    pub amount: Decimal,
    pub created_at: DateTime<Utc>,
}

/// 경매 생성 요청
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewAuction {
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub condition: String,
    pub starting_bid: Decimal,
    #[serde(default)]
    pub reserve_price: Option<Decimal>,
    pub bid_increment: Decimal,
    #[serde(default)]
    pub start_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub end_time: Option<DateTime<Utc>>,
    #[serde(default = "default_new_status")]
    pub status: AuctionStatus,
}

fn default_new_status() -> AuctionStatus {
    AuctionStatus::Draft
}

impl NewAuction {
    /// 생성 시점 검증
    pub fn validate(&self) -> Result<(), String> {
        if self.title.trim().is_empty() {
            return Err("경매 제목이 비어 있습니다.".to_string());
        }
        if self.starting_bid <= Decimal::ZERO {
            return Err("시작가는 0보다 커야 합니다.".to_string());
        }
        if self.bid_increment <= Decimal::ZERO {
            return Err("입찰 단위는 0보다 커야 합니다.".to_string());
        }
        if self.starting_bid > MAX_AMOUNT || self.bid_increment > MAX_AMOUNT {
            return Err(format!("금액은 {} 이하여야 합니다.", MAX_AMOUNT));
        }
        if let Some(reserve) = self.reserve_price {
            if reserve < self.starting_bid {
                return Err("최저 낙찰가는 시작가 이상이어야 합니다.".to_string());
            }
            if reserve > MAX_AMOUNT {
                return Err(format!("금액은 {} 이하여야 합니다.", MAX_AMOUNT));
            }
        }
        if let (Some(start), Some(end)) = (self.start_time, self.end_time) {
            if end <= start {
                return Err("종료 시간은 시작 시간 이후여야 합니다.".to_string());
            }
        }
        match self.status {
            AuctionStatus::Draft | AuctionStatus::Upcoming | AuctionStatus::Active => Ok(()),
            other => Err(format!("{} 상태로는 경매를 생성할 수 없습니다.", other)),
        }
    }
}

/// 화면 표시용 경매 (lifecycle 평가 결과 포함)
#[derive(Debug, Clone, Serialize)]
pub struct AuctionView {
    #[serde(flatten)]
    pub auction: Auction,
    pub effective_state: EffectiveState,
    pub min_next: Decimal,
}

impl AuctionView {
    pub fn new(auction: Auction, now: DateTime<Utc>) -> Self {
        let effective_state = auction.effective_state(now);
        let min_next = auction.min_next();
        Self {
            auction,
            effective_state,
            min_next,
        }
    }
}
// endregion: --- Models

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn new_auction() -> NewAuction {
        let now = Utc::now();
        NewAuction {
            title: "빈티지 카메라".to_string(),
            description: String::new(),
            category: String::new(),
            condition: String::new(),
            starting_bid: Decimal::from(1000),
            reserve_price: None,
            bid_increment: Decimal::from(50),
            start_time: Some(now),
            end_time: Some(now + Duration::hours(1)),
            status: AuctionStatus::Active,
        }
    }

    #[test]
    fn test_new_auction_validation() {
        assert!(new_auction().validate().is_ok());

        let mut reserve_below_start = new_auction();
        reserve_below_start.reserve_price = Some(Decimal::from(999));
        assert!(reserve_below_start.validate().is_err());

        let mut zero_increment = new_auction();
        zero_increment.bid_increment = Decimal::ZERO;
        assert!(zero_increment.validate().is_err());

        let mut inverted_window = new_auction();
        inverted_window.end_time = inverted_window.start_time;
        assert!(inverted_window.validate().is_err());

        let mut ended = new_auction();
        ended.status = AuctionStatus::Ended;
        assert!(ended.validate().is_err());
    }

    #[test]
    fn test_amounts_above_cap_are_rejected() {
        let near_max = Decimal::MAX - Decimal::from(10);

        let mut huge_start = new_auction();
        huge_start.starting_bid = near_max;
        huge_start.bid_increment = near_max;
        assert!(huge_start.validate().is_err());

        let mut huge_increment = new_auction();
        huge_increment.bid_increment = MAX_AMOUNT + Decimal::ONE;
        assert!(huge_increment.validate().is_err());

        let mut at_cap = new_auction();
        at_cap.starting_bid = MAX_AMOUNT;
        at_cap.bid_increment = MAX_AMOUNT;
        assert!(at_cap.validate().is_ok());
        assert_eq!(MAX_AMOUNT, Decimal::from(1_000_000_000_000_000_i64));
    }

    #[test]
    fn test_min_next_never_overflows() {
        let now = Utc::now();
        let auction = Auction {
            id: 1,
            title: "빈티지 카메라".to_string(),
            description: String::new(),
            category: String::new(),
            condition: String::new(),
            starting_bid: Decimal::MAX - Decimal::from(10),
            current_bid: None,
            reserve_price: None,
            bid_increment: Decimal::MAX - Decimal::from(10),
            start_time: Some(now),
            end_time: Some(now + Duration::hours(1)),
            status: AuctionStatus::Active,
            bid_count: 0,
            bidder_count: 0,
            created_at: now,
        };
        let view = AuctionView::new(auction, now);
        assert_eq!(view.min_next, Decimal::MAX);
        assert_eq!(view.effective_state, EffectiveState::Active);
    }

    #[test]
    fn test_status_round_trip_through_text() {
        for status in [
            AuctionStatus::Draft,
            AuctionStatus::Upcoming,
            AuctionStatus::Active,
            AuctionStatus::Ended,
            AuctionStatus::Cancelled,
        ] {
            assert_eq!(status.as_str().parse::<AuctionStatus>(), Ok(status));
        }
        assert!("paused".parse::<AuctionStatus>().is_err());
    }
}
