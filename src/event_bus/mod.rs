/// 경매 이벤트 발행
/// 입찰 확정 시 FloorAdvanced 를 발행하며, 구독자는 경매 id 로 필터링해서 받는다.
// region:    --- Imports
use crate::auction::events::AuctionEvent;
use crate::auction::model::AuctionId;
use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{debug, warn};

// endregion: --- Imports

// region:    --- Publisher Trait
#[async_trait]
pub trait BidEventPublisher: Send + Sync {
    async fn publish(&self, event: AuctionEvent) -> Result<(), String>;
}

/// 별도 태스크에서 발행. 발행 실패는 본 작업에 영향을 주지 않는다.
pub fn dispatch(publisher: &Arc<dyn BidEventPublisher>, event: AuctionEvent) {
    let publisher = Arc::clone(publisher);
    tokio::spawn(async move {
        let event_type = event.event_type();
        if let Err(e) = publisher.publish(event).await {
            warn!("{:<12} --> 이벤트 발행 실패 ({}): {}", "EventBus", event_type, e);
        }
    });
}
// endregion: --- Publisher Trait

// region:    --- Broadcast Publisher
/// 프로세스 내부 broadcast 채널
pub struct BroadcastPublisher {
    tx: broadcast::Sender<AuctionEvent>,
}

impl BroadcastPublisher {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    /// 특정 경매의 이벤트만 받는 구독 생성
    pub fn subscribe(&self, auction_id: AuctionId) -> AuctionSubscription {
        AuctionSubscription {
            auction_id,
            rx: self.tx.subscribe(),
        }
    }
}

#[async_trait]
impl BidEventPublisher for BroadcastPublisher {
    async fn publish(&self, event: AuctionEvent) -> Result<(), String> {
        // 구독자가 없으면 send 가 실패하지만 정상 상황이다
        match self.tx.send(event) {
            Ok(receivers) => debug!("{:<12} --> 이벤트 전달: 구독자 {}", "EventBus", receivers),
            Err(_) => debug!("{:<12} --> 구독자 없음", "EventBus"),
        }
        Ok(())
    }
}

pub struct AuctionSubscription {
    auction_id: AuctionId,
    rx: broadcast::Receiver<AuctionEvent>,
}

impl AuctionSubscription {
    /// 다음 이벤트 대기. 채널이 닫히면 None.
    pub async fn next(&mut self) -> Option<AuctionEvent> {
        loop {
            match self.rx.recv().await {
                Ok(event) if event.auction_id() == self.auction_id => return Some(event),
                Ok(_) => continue,
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!(
                        "{:<12} --> 구독 지연으로 이벤트 {}개 누락 (auction {})",
                        "EventBus", skipped, self.auction_id
                    );
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }
}
// endregion: --- Broadcast Publisher

// region:    --- Fanout Publisher
/// 여러 발행자에게 순서대로 전달
pub struct FanoutPublisher {
    publishers: Vec<Arc<dyn BidEventPublisher>>,
}

impl FanoutPublisher {
    pub fn new(publishers: Vec<Arc<dyn BidEventPublisher>>) -> Self {
        Self { publishers }
    }
}

#[async_trait]
impl BidEventPublisher for FanoutPublisher {
    async fn publish(&self, event: AuctionEvent) -> Result<(), String> {
        let mut errors = Vec::new();
        for publisher in &self.publishers {
            if let Err(e) = publisher.publish(event.clone()).await {
                errors.push(e);
            }
        }
        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors.join("; "))
        }
    }
}
// endregion: --- Fanout Publisher

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use rust_decimal::Decimal;

    fn floor_advanced(auction_id: AuctionId, amount: i64) -> AuctionEvent {
        AuctionEvent::FloorAdvanced {
            auction_id,
            bid_id: amount,
            bidder_id: 7,
            amount: Decimal::from(amount),
            min_next: Decimal::from(amount + 50),
            bid_count: 1,
            timestamp: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_subscription_filters_by_auction() {
        let publisher = BroadcastPublisher::new(16);
        let mut subscription = publisher.subscribe(2);

        publisher.publish(floor_advanced(1, 1100)).await.unwrap();
        publisher.publish(floor_advanced(2, 2100)).await.unwrap();

        match subscription.next().await {
            Some(AuctionEvent::FloorAdvanced {
                auction_id, amount, ..
            }) => {
                assert_eq!(auction_id, 2);
                assert_eq!(amount, Decimal::from(2100));
            }
            other => panic!("예상치 못한 이벤트: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_publish_without_subscribers_is_ok() {
        let publisher = BroadcastPublisher::new(4);
        assert!(publisher.publish(floor_advanced(1, 1100)).await.is_ok());
    }

    #[tokio::test]
    async fn test_fanout_reaches_every_publisher() {
        let first = Arc::new(BroadcastPublisher::new(4));
        let second = Arc::new(BroadcastPublisher::new(4));
        let mut first_sub = first.subscribe(5);
        let mut second_sub = second.subscribe(5);

        let fanout = FanoutPublisher::new(vec![
            first.clone() as Arc<dyn BidEventPublisher>,
            second.clone() as Arc<dyn BidEventPublisher>,
        ]);
        fanout.publish(floor_advanced(5, 1500)).await.unwrap();

        assert!(first_sub.next().await.is_some());
        assert!(second_sub.next().await.is_some());
    }
}
