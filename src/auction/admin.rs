/// 관리자 경매 관리
/// 1. 경매 생성 (검증 후 저장소를 통해서만 생성)
/// 2. 상태 전환 (draft/active/cancelled)
/// 3. 경매 삭제 (입찰 포함)
// region:    --- Imports
use super::events::AuctionEvent;
use super::model::{Auction, AuctionId, AuctionStatus, NewAuction};
use super::status;
use crate::audit::{self, AuditEvent, AuditLog};
use crate::auth::CurrentUser;
use crate::clock::Clock;
use crate::event_bus::{self, BidEventPublisher};
use crate::store::{AuctionStore, StoreError};
use std::sync::Arc;
use tracing::{info, warn};

// endregion: --- Imports

// region:    --- Admin Error
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum AdminError {
    #[error("로그인이 필요합니다.")]
    Unauthenticated,

    #[error("관리자 권한이 필요합니다.")]
    Forbidden,

    #[error("경매를 찾을 수 없습니다.")]
    NotFound,

    #[error("잘못된 경매 정보: {0}")]
    InvalidAuction(String),

    #[error("{from} 상태에서 {to} 상태로 변경할 수 없습니다.")]
    InvalidTransition {
        from: AuctionStatus,
        to: AuctionStatus,
    },

    #[error("경매 상태가 동시에 변경되었습니다. 다시 시도해 주세요.")]
    Conflict,

    #[error("저장소를 일시적으로 사용할 수 없습니다: {0}")]
    StoreUnavailable(String),
}

impl AdminError {
    pub fn code(&self) -> &'static str {
        match self {
            AdminError::Unauthenticated => "UNAUTHENTICATED",
            AdminError::Forbidden => "FORBIDDEN",
            AdminError::NotFound => "NOT_FOUND",
            AdminError::InvalidAuction(_) => "INVALID_AUCTION",
            AdminError::InvalidTransition { .. } => "INVALID_TRANSITION",
            AdminError::Conflict => "CONFLICT",
            AdminError::StoreUnavailable(_) => "STORE_UNAVAILABLE",
        }
    }
}

impl From<StoreError> for AdminError {
    fn from(e: StoreError) -> Self {
        AdminError::StoreUnavailable(e.to_string())
    }
}
// endregion: --- Admin Error

// region:    --- Auction Admin
pub struct AuctionAdmin {
    store: Arc<dyn AuctionStore>,
    clock: Arc<dyn Clock>,
    audit: Arc<dyn AuditLog>,
    publisher: Arc<dyn BidEventPublisher>,
}

impl AuctionAdmin {
    pub fn new(
        store: Arc<dyn AuctionStore>,
        clock: Arc<dyn Clock>,
        audit: Arc<dyn AuditLog>,
        publisher: Arc<dyn BidEventPublisher>,
    ) -> Self {
        Self {
            store,
            clock,
            audit,
            publisher,
        }
    }

    fn require_admin(caller: Option<&CurrentUser>) -> Result<&CurrentUser, AdminError> {
        let user = caller.ok_or(AdminError::Unauthenticated)?;
        if !user.is_admin() {
            return Err(AdminError::Forbidden);
        }
        Ok(user)
    }

    /// 1. 경매 생성
    pub async fn create_auction(
        &self,
        caller: Option<&CurrentUser>,
        new: NewAuction,
    ) -> Result<Auction, AdminError> {
        let admin = Self::require_admin(caller)?;
        new.validate().map_err(AdminError::InvalidAuction)?;

        let now = self.clock.now();
        let auction = self.store.create_auction(new, now).await?;
        info!(
            "{:<12} --> 경매 생성: id {} (admin {})",
            "Admin", auction.id, admin.id
        );
        audit::dispatch(
            &self.audit,
            AuditEvent::success("auction.create", "auction", auction.id, Some(admin.id), now)
                .for_auction(Some(auction.id)),
        );
        Ok(auction)
    }

    /// 2. 상태 전환
    /// 이미 커밋된 입찰에는 영향을 주지 않고, 다음 입찰 시도부터 적용된다.
    pub async fn transition_status(
        &self,
        caller: Option<&CurrentUser>,
        auction_id: AuctionId,
        to: AuctionStatus,
    ) -> Result<Auction, AdminError> {
        let admin = Self::require_admin(caller)?;
        let now = self.clock.now();

        let auction = self
            .store
            .get_auction(auction_id)
            .await?
            .ok_or(AdminError::NotFound)?;
        let from = auction.status;
        if !status::can_transition(from, to) {
            warn!(
                "{:<12} --> 허용되지 않는 상태 전환: {} -> {} (auction {})",
                "Admin", from, to, auction_id
            );
            return Err(AdminError::InvalidTransition { from, to });
        }

        if !self.store.update_status(auction_id, from, to).await? {
            return Err(AdminError::Conflict);
        }

        info!(
            "{:<12} --> 상태 전환: auction {} {} -> {}",
            "Admin", auction_id, from, to
        );
        audit::dispatch(
            &self.audit,
            AuditEvent::success("auction.status", "auction", auction_id, Some(admin.id), now)
                .for_auction(Some(auction_id)),
        );
        event_bus::dispatch(
            &self.publisher,
            AuctionEvent::StatusChanged {
                auction_id,
                from,
                to,
                timestamp: now,
            },
        );

        Ok(Auction {
            status: to,
            ..auction
        })
    }

    /// 3. 경매 삭제
    pub async fn delete_auction(
        &self,
        caller: Option<&CurrentUser>,
        auction_id: AuctionId,
    ) -> Result<(), AdminError> {
        let admin = Self::require_admin(caller)?;
        let now = self.clock.now();

        if !self.store.delete_auction(auction_id).await? {
            return Err(AdminError::NotFound);
        }

        info!("{:<12} --> 경매 삭제: id {}", "Admin", auction_id);
        audit::dispatch(
            &self.audit,
            AuditEvent::success("auction.delete", "auction", auction_id, Some(admin.id), now)
                .for_auction(Some(auction_id)),
        );
        Ok(())
    }
}
// endregion: --- Auction Admin
