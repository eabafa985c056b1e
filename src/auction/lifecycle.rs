/// 경매 lifecycle 평가
/// 저장된 상태(힌트)와 입찰 기간으로부터 실제 적용 상태를 계산한다.
/// 1. cancelled 는 시간과 무관하게 항상 우선한다.
/// 2. 그 외에는 입찰 기간(start_time, end_time)이 기준이다.
/// 시각 비교는 모두 UTC 절대 시각끼리만 수행한다.
// region:    --- Imports
use super::model::AuctionStatus;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

// endregion: --- Imports

// region:    --- Effective State
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EffectiveState {
    Upcoming,
    Active,
    Ended,
    Cancelled,
}

impl EffectiveState {
    pub fn as_str(&self) -> &'static str {
        match self {
            EffectiveState::Upcoming => "upcoming",
            EffectiveState::Active => "active",
            EffectiveState::Ended => "ended",
            EffectiveState::Cancelled => "cancelled",
        }
    }

    pub fn is_active(&self) -> bool {
        matches!(self, EffectiveState::Active)
    }
}

impl fmt::Display for EffectiveState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
// endregion: --- Effective State

// region:    --- Evaluate
/// 실제 적용 상태 계산. 실패하지 않는다.
pub fn evaluate(
    start_time: Option<DateTime<Utc>>,
    end_time: Option<DateTime<Utc>>,
    persisted: AuctionStatus,
    now: DateTime<Utc>,
) -> EffectiveState {
    if persisted == AuctionStatus::Cancelled {
        return EffectiveState::Cancelled;
    }

    let has_ended = end_time.is_some_and(|end| end <= now);

    let Some(start) = start_time else {
        // 시작 시간이 없으면 이미 시작된 것으로 보고 저장된 상태를 따른다
        if has_ended {
            return EffectiveState::Ended;
        }
        return match persisted {
            AuctionStatus::Active => EffectiveState::Active,
            AuctionStatus::Ended => EffectiveState::Ended,
            _ => EffectiveState::Upcoming,
        };
    };

    let has_started = start <= now;

    if has_ended {
        EffectiveState::Ended
    } else if !has_started {
        EffectiveState::Upcoming
    } else {
        EffectiveState::Active
    }
}
// endregion: --- Evaluate
