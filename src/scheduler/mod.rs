/// 경매 상태 힌트 동기화 스케줄러
/// 저장된 status 를 입찰 기간에 맞춰 갱신한다 (upcoming -> active, upcoming/active -> ended).
/// 입찰 가능 여부는 항상 lifecycle 평가로 판단하므로, 이 값은 조회/관리 화면용 힌트일 뿐이다.
// region:    --- Imports
use crate::clock::Clock;
use crate::store::AuctionStore;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio::time::{interval, Duration};
use tracing::{debug, error, info};

// endregion: --- Imports

// region:    --- Status Scheduler
pub struct StatusScheduler {
    store: Arc<dyn AuctionStore>,
    clock: Arc<dyn Clock>,
    period: Duration,
}

impl StatusScheduler {
    pub fn new(store: Arc<dyn AuctionStore>, clock: Arc<dyn Clock>, period: Duration) -> Self {
        Self {
            store,
            clock,
            period,
        }
    }

    /// 스케줄러 시작
    pub fn start(self) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = interval(self.period);
            loop {
                ticker.tick().await;
                if let Err(e) = self.run_once().await {
                    error!(
                        "{:<12} --> 경매 상태 동기화 중 오류 발생: {:?}",
                        "Scheduler", e
                    );
                }
            }
        })
    }

    /// 한 번 동기화
    pub async fn run_once(&self) -> Result<u64, crate::store::StoreError> {
        let changed = self.store.sync_statuses(self.clock.now()).await?;
        if changed > 0 {
            info!("{:<12} --> 경매 상태 {}건 갱신", "Scheduler", changed);
        } else {
            debug!("{:<12} --> 갱신할 경매 상태 없음", "Scheduler");
        }
        Ok(changed)
    }
}
// endregion: --- Status Scheduler
