/// 낙찰 후 입찰 제한
/// 최근 낙찰 시각(경매 종료 시각)으로부터 period 가 지나기 전까지는 입찰할 수 없다.
/// 캐시하지 않고 매 입찰 시도마다 저장소에서 새로 계산한다.
use crate::auction::model::UserId;
use crate::store::{AuctionStore, StoreError};
use chrono::{DateTime, Duration, Utc};

pub const DEFAULT_COOLDOWN_HOURS: i64 = 24;

#[derive(Debug, Clone, Copy)]
pub struct CooldownGate {
    period: Duration,
}

impl Default for CooldownGate {
    fn default() -> Self {
        Self::new(Duration::hours(DEFAULT_COOLDOWN_HOURS))
    }
}

impl CooldownGate {
    pub fn new(period: Duration) -> Self {
        Self { period }
    }

    /// 제한 중이면 해제 시각 반환
    pub async fn restricted_until(
        &self,
        store: &dyn AuctionStore,
        bidder_id: UserId,
        now: DateTime<Utc>,
    ) -> Result<Option<DateTime<Utc>>, StoreError> {
        let Some(won_at) = store.latest_win_at(bidder_id, now).await? else {
            return Ok(None);
        };
        let until = won_at + self.period;
        Ok((now < until).then_some(until))
    }

    pub async fn can_user_bid(
        &self,
        store: &dyn AuctionStore,
        bidder_id: UserId,
        now: DateTime<Utc>,
    ) -> Result<bool, StoreError> {
        Ok(self.restricted_until(store, bidder_id, now).await?.is_none())
    }
}
