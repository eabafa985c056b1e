/// 경매 컬럼
macro_rules! auction_columns {
    () => {
        "id, title, description, category, condition, starting_bid, current_bid, reserve_price, bid_increment, start_time, end_time, status, bid_count, bidder_count, created_at"
    };
}

/// 경매 생성
pub const INSERT_AUCTION: &str = concat!(
    "INSERT INTO auctions (title, description, category, condition, starting_bid, reserve_price, bid_increment, start_time, end_time, status, created_at)
     VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
     RETURNING ",
    auction_columns!()
);

/// 경매 조회
pub const GET_AUCTION: &str = concat!("SELECT ", auction_columns!(), " FROM auctions WHERE id = $1");

/// 경매 조회 (행 잠금)
pub const GET_AUCTION_FOR_UPDATE: &str = concat!(
    "SELECT ",
    auction_columns!(),
    " FROM auctions WHERE id = $1 FOR UPDATE"
);

/// 모든 경매 조회
pub const GET_ALL_AUCTIONS: &str = concat!(
    "SELECT ",
    auction_columns!(),
    " FROM auctions ORDER BY created_at DESC, id DESC"
);

/// 경매 삭제 (bids 는 ON DELETE CASCADE)
pub const DELETE_AUCTION: &str = "DELETE FROM auctions WHERE id = $1";

/// 상태 변경 (낙관적)
pub const UPDATE_STATUS: &str = "UPDATE auctions SET status = $3 WHERE id = $1 AND status = $2";

/// upcoming -> active 상태 힌트 동기화
pub const SYNC_UPCOMING_TO_ACTIVE: &str = "UPDATE auctions SET status = 'active'
     WHERE status = 'upcoming' AND start_time IS NOT NULL AND start_time <= $1
       AND (end_time IS NULL OR end_time > $1)";

/// upcoming/active -> ended 상태 힌트 동기화
pub const SYNC_TO_ENDED: &str = "UPDATE auctions SET status = 'ended'
     WHERE status IN ('upcoming', 'active') AND end_time IS NOT NULL AND end_time <= $1";

/// 현재가 조건부 갱신
/// current_bid 가 검증 시점 값과 같고, 취소/종료되지 않은 경우에만 갱신된다.
pub const ADVANCE_FLOOR: &str = concat!(
    "UPDATE auctions SET current_bid = $2, bid_count = bid_count + 1
     WHERE id = $1
       AND current_bid IS NOT DISTINCT FROM $3
       AND status <> 'cancelled'
       AND (end_time IS NULL OR end_time > $4)
     RETURNING ",
    auction_columns!()
);

/// 입찰자 수 재계산
pub const REFRESH_BIDDER_COUNT: &str = "UPDATE auctions
     SET bidder_count = (SELECT COUNT(DISTINCT bidder_id) FROM bids WHERE auction_id = $1)
     WHERE id = $1
     RETURNING bidder_count";

/// 입찰 취소에 따른 입찰 수 감소
pub const DECREMENT_BID_COUNT: &str = "UPDATE auctions SET bid_count = bid_count - 1 WHERE id = $1";

/// 입찰 추가
pub const INSERT_BID: &str = "INSERT INTO bids (auction_id, bidder_id, amount, created_at)
     VALUES ($1, $2, $3, $4)
     RETURNING id, auction_id, bidder_id, amount, created_at";

/// 입찰 조회
pub const GET_BID: &str = "SELECT id, auction_id, bidder_id, amount, created_at FROM bids WHERE id = $1";

/// 입찰 삭제
pub const DELETE_BID: &str = "DELETE FROM bids WHERE id = $1";

/// 경매 입찰 이력 조회
pub const GET_AUCTION_BIDS: &str = r#"
    SELECT id, auction_id, bidder_id, amount, created_at
    FROM bids
    WHERE auction_id = $1
    ORDER BY created_at DESC, id DESC
"#;

/// 최근 낙찰 시각 조회
pub const GET_LATEST_WIN: &str = r#"
    SELECT MAX(a.end_time)
    FROM auctions a
    JOIN bids b ON b.auction_id = a.id AND b.amount = a.current_bid
    WHERE b.bidder_id = $1
      AND a.status <> 'cancelled'
      AND a.end_time IS NOT NULL
      AND a.end_time <= $2
"#;

/// 감사 로그 추가
pub const INSERT_AUDIT_LOG: &str = "INSERT INTO audit_logs (action, resource_type, resource_id, actor_id, auction_id, success, code, error_message, created_at)
     VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)";
