//! PostgresStore 통합 테스트
//! DATABASE_URL 이 없으면 건너뛴다.
use auction_bidding::auction::lifecycle::EffectiveState;
use auction_bidding::auction::model::{Auction, AuctionStatus, Bid, NewAuction, UserId};
use auction_bidding::audit::TracingAuditLog;
use auction_bidding::bidding::commands::{BiddingService, PlaceBidCommand};
use auction_bidding::bidding::error::BidError;
use auction_bidding::bidding::validator::AmountRejection;
use auction_bidding::clock::ManualClock;
use auction_bidding::database::DatabaseManager;
use auction_bidding::event_bus::BroadcastPublisher;
use auction_bidding::store::{
    AuctionStore, BidCommit, BidDeletion, CommitOutcome, DeleteOutcome, PostgresStore,
};
use chrono::{DateTime, Duration, TimeZone, Utc};
use rust_decimal::Decimal;
use std::sync::{Arc, OnceLock};
use tokio::sync::Mutex;
use tracing::{info, warn};

// region:    --- Setup
static SCHEMA_READY: OnceLock<Mutex<bool>> = OnceLock::new();

/// 트레이싱 초기화
fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .without_time()
        .with_target(false)
        .with_test_writer()
        .try_init();
}

/// 데이터베이스 연결 및 스키마 초기화 (한 번만)
async fn setup() -> Option<Arc<PostgresStore>> {
    init_tracing();
    let Ok(database_url) = std::env::var("DATABASE_URL") else {
        warn!("DATABASE_URL 미설정: Postgres 테스트를 건너뜁니다.");
        return None;
    };

    let db_manager = Arc::new(
        DatabaseManager::connect(&database_url, 5)
            .await
            .expect("데이터베이스 연결 실패"),
    );
    let mut ready = SCHEMA_READY
        .get_or_init(|| Mutex::new(false))
        .lock()
        .await;
    if !*ready {
        db_manager
            .initialize_database()
            .await
            .expect("스키마 초기화 실패");
        *ready = true;
    }
    Some(Arc::new(PostgresStore::new(db_manager)))
}

/// 마이크로초 이하를 버린 현재 시각 (TIMESTAMPTZ 정밀도)
fn now_secs() -> DateTime<Utc> {
    Utc.timestamp_opt(Utc::now().timestamp(), 0).unwrap()
}

fn d(v: i64) -> Decimal {
    Decimal::from(v)
}

/// 시작가 1000, 입찰 단위 50 경매 생성
async fn create_auction(
    store: &PostgresStore,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
) -> Auction {
    store
        .create_auction(
            NewAuction {
                title: "Postgres 테스트 경매".to_string(),
                description: String::new(),
                category: String::new(),
                condition: String::new(),
                starting_bid: d(1000),
                reserve_price: None,
                bid_increment: d(50),
                start_time: Some(start),
                end_time: Some(end),
                status: AuctionStatus::Active,
            },
            start,
        )
        .await
        .expect("경매 생성 실패")
}

/// 실행마다 겹치지 않는 입찰자 id
fn bidder(auction: &Auction, n: i64) -> UserId {
    auction.id * 100 + n
}

fn commit(
    auction: &Auction,
    bidder_id: UserId,
    amount: i64,
    expected: Option<i64>,
    at: DateTime<Utc>,
) -> BidCommit {
    BidCommit {
        auction_id: auction.id,
        bidder_id,
        amount: d(amount),
        expected_current_bid: expected.map(d),
        placed_at: at,
    }
}

fn committed(outcome: CommitOutcome) -> (Bid, Auction) {
    match outcome {
        CommitOutcome::Committed { bid, auction } => (bid, auction),
        other => panic!("커밋 실패: {:?}", other),
    }
}

fn service(store: Arc<PostgresStore>, clock: Arc<ManualClock>) -> BiddingService {
    BiddingService::new(
        store,
        clock,
        Arc::new(TracingAuditLog),
        Arc::new(BroadcastPublisher::new(16)),
    )
}
// endregion: --- Setup

/// 시작가 1000, 단위 50: 1040 거절, 1050 성공
#[tokio::test]
async fn test_postgres_place_bid_end_to_end() {
    let Some(store) = setup().await else { return };
    let now = now_secs();
    let auction = create_auction(
        &store,
        now - Duration::minutes(10),
        now + Duration::hours(1),
    )
    .await;
    let clock = Arc::new(ManualClock::new(now));
    let service = service(Arc::clone(&store), clock);

    let rejected = service
        .place_bid(
            Some(bidder(&auction, 1)),
            PlaceBidCommand {
                auction_id: auction.id,
                amount: d(1040),
            },
        )
        .await;
    assert_eq!(
        rejected,
        Err(BidError::InvalidAmount {
            reason: AmountRejection::BelowMinimum,
            min_next: d(1050),
        })
    );

    let receipt = service
        .place_bid(
            Some(bidder(&auction, 1)),
            PlaceBidCommand {
                auction_id: auction.id,
                amount: d(1050),
            },
        )
        .await
        .expect("입찰 실패");
    assert_eq!(receipt.current_bid, d(1050));
    assert_eq!(receipt.min_next, d(1100));
    assert_eq!(receipt.bid_count, 1);
    assert_eq!(receipt.bidder_count, 1);
    info!("입찰 성공: {:?}", receipt);

    let stored = store.get_auction(auction.id).await.unwrap().unwrap();
    assert_eq!(stored.current_bid, Some(d(1050)));
    let bids = store.list_bids(auction.id).await.unwrap();
    assert_eq!(bids.len(), 1);
    assert_eq!(bids[0].id, receipt.bid_id);
}

/// 같은 floor 를 본 두 커밋 중 하나만 성공
#[tokio::test]
async fn test_postgres_concurrent_commits_one_wins() {
    let Some(store) = setup().await else { return };
    let now = now_secs();
    let auction = create_auction(
        &store,
        now - Duration::minutes(10),
        now + Duration::hours(1),
    )
    .await;
    committed(
        store
            .commit_bid(commit(&auction, bidder(&auction, 1), 1050, None, now))
            .await
            .unwrap(),
    );

    let (first, second) = tokio::join!(
        store.commit_bid(commit(&auction, bidder(&auction, 2), 1100, Some(1050), now)),
        store.commit_bid(commit(&auction, bidder(&auction, 3), 1150, Some(1050), now)),
    );
    let (winner, loser) = match (first.unwrap(), second.unwrap()) {
        (CommitOutcome::Committed { auction, .. }, loser)
        | (loser, CommitOutcome::Committed { auction, .. }) => (auction, loser),
        other => panic!("정확히 하나만 성공해야 합니다: {:?}", other),
    };
    match loser {
        CommitOutcome::FloorMoved(fresh) => {
            assert_eq!(fresh.current_bid, winner.current_bid);
            assert_eq!(fresh.min_next(), winner.current_bid.unwrap() + d(50));
        }
        other => panic!("FloorMoved 가 아닙니다: {:?}", other),
    }

    let stored = store.get_auction(auction.id).await.unwrap().unwrap();
    assert_eq!(stored.current_bid, winner.current_bid);
    assert_eq!(stored.bid_count, 2);
    assert_eq!(stored.bidder_count, 2);
}

/// 조건부 갱신 실패 사유 판별 (종료/취소 vs floor 변경)
#[tokio::test]
async fn test_postgres_commit_rejected_when_closed() {
    let Some(store) = setup().await else { return };
    let now = now_secs();
    let end = now + Duration::hours(1);
    let auction = create_auction(&store, now - Duration::minutes(10), end).await;

    let outcome = store
        .commit_bid(commit(&auction, bidder(&auction, 1), 1050, None, end))
        .await
        .unwrap();
    assert!(matches!(outcome, CommitOutcome::Closed(_)));

    assert!(store
        .update_status(auction.id, AuctionStatus::Active, AuctionStatus::Cancelled)
        .await
        .unwrap());
    let outcome = store
        .commit_bid(commit(&auction, bidder(&auction, 1), 1050, None, now))
        .await
        .unwrap();
    assert!(matches!(outcome, CommitOutcome::Closed(_)));
    assert!(store.list_bids(auction.id).await.unwrap().is_empty());
}

/// 삭제 트랜잭션 안에서 최고 입찰 여부와 경매 상태를 다시 확인
#[tokio::test]
async fn test_postgres_delete_rechecks() {
    let Some(store) = setup().await else { return };
    let now = now_secs();
    let auction = create_auction(
        &store,
        now - Duration::minutes(10),
        now + Duration::hours(1),
    )
    .await;
    let (lower, _) = committed(
        store
            .commit_bid(commit(&auction, bidder(&auction, 1), 1050, None, now))
            .await
            .unwrap(),
    );
    let (middle, _) = committed(
        store
            .commit_bid(commit(&auction, bidder(&auction, 2), 1100, Some(1050), now))
            .await
            .unwrap(),
    );
    let (other_lower, _) = committed(
        store
            .commit_bid(commit(&auction, bidder(&auction, 3), 1150, Some(1100), now))
            .await
            .unwrap(),
    );
    committed(
        store
            .commit_bid(commit(&auction, bidder(&auction, 4), 1200, Some(1150), now))
            .await
            .unwrap(),
    );

    let outcome = store
        .delete_bid(BidDeletion {
            bid_id: lower.id,
            bidder_id: bidder(&auction, 2),
            requested_at: now,
        })
        .await
        .unwrap();
    assert!(matches!(outcome, DeleteOutcome::NotOwned));

    match store
        .delete_bid(BidDeletion {
            bid_id: middle.id,
            bidder_id: bidder(&auction, 2),
            requested_at: now,
        })
        .await
        .unwrap()
    {
        DeleteOutcome::Deleted { auction, .. } => {
            assert_eq!(auction.bid_count, 3);
            assert_eq!(auction.bidder_count, 3);
            assert_eq!(auction.current_bid, Some(d(1200)));
        }
        other => panic!("예상치 못한 결과: {:?}", other),
    }

    assert!(store
        .update_status(auction.id, AuctionStatus::Active, AuctionStatus::Cancelled)
        .await
        .unwrap());
    let outcome = store
        .delete_bid(BidDeletion {
            bid_id: other_lower.id,
            bidder_id: bidder(&auction, 3),
            requested_at: now,
        })
        .await
        .unwrap();
    assert!(matches!(
        outcome,
        DeleteOutcome::Closed(EffectiveState::Cancelled)
    ));
    assert!(store.get_bid(other_lower.id).await.unwrap().is_some());
}

#[tokio::test]
async fn test_postgres_highest_bid_is_not_deletable() {
    let Some(store) = setup().await else { return };
    let now = now_secs();
    let auction = create_auction(
        &store,
        now - Duration::minutes(10),
        now + Duration::hours(1),
    )
    .await;
    let (highest, _) = committed(
        store
            .commit_bid(commit(&auction, bidder(&auction, 1), 1050, None, now))
            .await
            .unwrap(),
    );

    let outcome = store
        .delete_bid(BidDeletion {
            bid_id: highest.id,
            bidder_id: bidder(&auction, 1),
            requested_at: now,
        })
        .await
        .unwrap();
    assert!(matches!(outcome, DeleteOutcome::IsHighest));
    assert!(store.get_bid(highest.id).await.unwrap().is_some());
}

/// 낙찰 시각(종료 시각) 기준 24시간 입찰 제한
#[tokio::test]
async fn test_postgres_cooldown_after_win() {
    let Some(store) = setup().await else { return };
    let now = now_secs();
    let end = now - Duration::hours(1);
    let auction = create_auction(&store, now - Duration::hours(3), end).await;
    let (winner, loser) = (bidder(&auction, 1), bidder(&auction, 2));

    committed(
        store
            .commit_bid(commit(&auction, loser, 1050, None, now - Duration::hours(2)))
            .await
            .unwrap(),
    );
    committed(
        store
            .commit_bid(commit(&auction, winner, 1100, Some(1050), now - Duration::hours(2)))
            .await
            .unwrap(),
    );

    assert_eq!(store.latest_win_at(winner, now).await.unwrap(), Some(end));
    assert_eq!(store.latest_win_at(loser, now).await.unwrap(), None);
    // 종료 전 시각 기준으로는 아직 낙찰이 아니다
    assert_eq!(
        store
            .latest_win_at(winner, end - Duration::seconds(1))
            .await
            .unwrap(),
        None
    );

    let clock = Arc::new(ManualClock::new(
        end + Duration::hours(23) + Duration::minutes(59),
    ));
    let service = service(Arc::clone(&store), Arc::clone(&clock));
    assert_eq!(
        service.restricted_until(winner).await.unwrap(),
        Some(end + Duration::hours(24))
    );
    assert!(!service.can_user_bid(winner).await.unwrap());

    clock.set(end + Duration::hours(24) + Duration::minutes(1));
    assert!(service.can_user_bid(winner).await.unwrap());
}
