use super::model::AuctionStatus;

/// 관리자 상태 전환 허용 여부
/// - draft    -> active, cancelled
/// - upcoming -> cancelled (active/ended 는 시간에 따라 자동 평가)
/// - active   -> draft(일시정지), cancelled
/// - ended, cancelled 는 더 이상 전환할 수 없다
pub fn can_transition(from: AuctionStatus, to: AuctionStatus) -> bool {
    use AuctionStatus::*;
    if is_terminal(from) {
        return false;
    }
    matches!(
        (from, to),
        (Draft, Active) | (Draft, Cancelled) | (Upcoming, Cancelled) | (Active, Draft) | (Active, Cancelled)
    )
}

pub fn is_terminal(status: AuctionStatus) -> bool {
    matches!(status, AuctionStatus::Ended | AuctionStatus::Cancelled)
}

#[cfg(test)]
mod tests {
    use super::*;
    use AuctionStatus::*;

    const ALL: [AuctionStatus; 5] = [Draft, Upcoming, Active, Ended, Cancelled];

    #[test]
    fn test_allowed_transitions() {
        assert!(can_transition(Draft, Active));
        assert!(can_transition(Draft, Cancelled));
        assert!(can_transition(Upcoming, Cancelled));
        assert!(can_transition(Active, Draft));
        assert!(can_transition(Active, Cancelled));

        assert!(!can_transition(Upcoming, Active));
        assert!(!can_transition(Active, Ended));
        assert!(!can_transition(Draft, Draft));
    }

    #[test]
    fn test_terminal_states_never_reopen() {
        for from in [Ended, Cancelled] {
            assert!(is_terminal(from));
            for to in ALL {
                assert!(!can_transition(from, to), "{} -> {}", from, to);
            }
        }
    }
}
