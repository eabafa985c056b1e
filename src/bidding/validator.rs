/// 입찰 금액 검증
/// minNext = floor + increment
/// 유효 조건: amount >= minNext 이고 (amount - floor) 가 increment 의 배수
/// 클라이언트 사전 검증용이며, 커밋 시점에 반드시 다시 수행한다.
// region:    --- Imports
use crate::auction::model::MAX_AMOUNT;
use rust_decimal::Decimal;
use serde::Serialize;
use std::fmt;

// endregion: --- Imports

// region:    --- Bid Check
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AmountRejection {
    BelowMinimum,
    NotIncrementMultiple,
    InvalidIncrement,
    OutOfRange,
}

impl fmt::Display for AmountRejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let message = match self {
            AmountRejection::BelowMinimum => "입찰 금액이 최소 입찰 금액보다 낮습니다.",
            AmountRejection::NotIncrementMultiple => "입찰 금액은 입찰 단위의 배수만큼 올라야 합니다.",
            AmountRejection::InvalidIncrement => "경매의 입찰 단위가 올바르지 않습니다.",
            AmountRejection::OutOfRange => "입찰 금액이 허용 범위를 벗어났습니다.",
        };
        f.write_str(message)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BidCheck {
    Valid,
    Invalid {
        reason: AmountRejection,
        min_next: Decimal,
    },
}

impl BidCheck {
    pub fn is_valid(&self) -> bool {
        matches!(self, BidCheck::Valid)
    }
}
// endregion: --- Bid Check

// region:    --- Validate
pub fn validate_bid(amount: Decimal, current_floor: Decimal, increment: Decimal) -> BidCheck {
    if increment <= Decimal::ZERO {
        return BidCheck::Invalid {
            reason: AmountRejection::InvalidIncrement,
            min_next: current_floor,
        };
    }

    let Some(min_next) = current_floor.checked_add(increment) else {
        return BidCheck::Invalid {
            reason: AmountRejection::OutOfRange,
            min_next: current_floor,
        };
    };

    if amount > MAX_AMOUNT {
        return BidCheck::Invalid {
            reason: AmountRejection::OutOfRange,
            min_next,
        };
    }

    if amount < min_next {
        return BidCheck::Invalid {
            reason: AmountRejection::BelowMinimum,
            min_next,
        };
    }

    if !((amount - current_floor) % increment).is_zero() {
        return BidCheck::Invalid {
            reason: AmountRejection::NotIncrementMultiple,
            min_next,
        };
    }

    BidCheck::Valid
}
// endregion: --- Validate
