use crate::auction::lifecycle::EffectiveState;
use crate::bidding::validator::AmountRejection;
use crate::store::StoreError;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

/// 입찰/취소 경계에서 반환되는 거절 사유
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum BidError {
    #[error("로그인이 필요합니다.")]
    Unauthenticated,

    #[error("최근 낙찰로 인해 {until} 까지 입찰할 수 없습니다.")]
    BiddingRestricted { until: DateTime<Utc> },

    #[error("진행 중인 경매가 아닙니다.")]
    AuctionNotActive { state: Option<EffectiveState> },

    #[error("{reason} 최소 입찰 금액: {min_next}")]
    InvalidAmount {
        reason: AmountRejection,
        min_next: Decimal,
    },

    #[error("다른 입찰이 먼저 처리되었습니다. 최소 입찰 금액: {min_next}")]
    Conflict { min_next: Decimal },

    #[error("입찰을 찾을 수 없습니다.")]
    NotFound,

    #[error("본인의 입찰만 취소할 수 있습니다.")]
    NotOwned,

    #[error("현재 최고 입찰은 취소할 수 없습니다.")]
    CannotCancelHighestBid,

    #[error("저장소를 일시적으로 사용할 수 없습니다: {0}")]
    StoreUnavailable(String),
}

impl BidError {
    pub fn code(&self) -> &'static str {
        match self {
            BidError::Unauthenticated => "UNAUTHENTICATED",
            BidError::BiddingRestricted { .. } => "BIDDING_RESTRICTED",
            BidError::AuctionNotActive { .. } => "AUCTION_NOT_ACTIVE",
            BidError::InvalidAmount { .. } => "INVALID_AMOUNT",
            BidError::Conflict { .. } => "CONFLICT",
            BidError::NotFound => "NOT_FOUND",
            BidError::NotOwned => "NOT_OWNED",
            BidError::CannotCancelHighestBid => "CANNOT_CANCEL_HIGHEST_BID",
            BidError::StoreUnavailable(_) => "STORE_UNAVAILABLE",
        }
    }

    /// 재시도 시 사용할 최소 입찰 금액
    pub fn min_next(&self) -> Option<Decimal> {
        match self {
            BidError::InvalidAmount { min_next, .. } | BidError::Conflict { min_next } => {
                Some(*min_next)
            }
            _ => None,
        }
    }

    /// 같은 요청을 그대로 재시도해도 되는 오류인지
    pub fn is_retryable(&self) -> bool {
        matches!(self, BidError::StoreUnavailable(_))
    }
}

impl From<StoreError> for BidError {
    fn from(e: StoreError) -> Self {
        BidError::StoreUnavailable(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_store_failures_are_retryable() {
        assert!(BidError::StoreUnavailable("timeout".into()).is_retryable());
        assert!(!BidError::Conflict {
            min_next: Decimal::from(1150)
        }
        .is_retryable());
        assert!(!BidError::Unauthenticated.is_retryable());
    }

    #[test]
    fn test_min_next_carried_for_amount_errors() {
        let invalid = BidError::InvalidAmount {
            reason: AmountRejection::BelowMinimum,
            min_next: Decimal::from(1050),
        };
        assert_eq!(invalid.min_next(), Some(Decimal::from(1050)));
        assert_eq!(invalid.code(), "INVALID_AMOUNT");
        assert_eq!(BidError::NotOwned.min_next(), None);
    }
}
