/// 감사 로그
/// log_event 는 fire-and-forget 으로 호출되며, 실패해도 본 작업에 영향을 주지 않는다.
// region:    --- Imports
use crate::auction::model::{AuctionId, UserId};
use crate::store::queries;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::PgPool;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{info, warn};

// endregion: --- Imports

// region:    --- Audit Event
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AuditEvent {
    pub action: String,
    pub resource_type: String,
    pub resource_id: Option<String>,
    pub actor_id: Option<UserId>,
    pub auction_id: Option<AuctionId>,
    pub success: bool,
    pub code: Option<String>,
    pub error_message: Option<String>,
    pub timestamp: DateTime<Utc>,
}

impl AuditEvent {
    pub fn success(
        action: &str,
        resource_type: &str,
        resource_id: impl ToString,
        actor_id: Option<UserId>,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            action: action.to_string(),
            resource_type: resource_type.to_string(),
            resource_id: Some(resource_id.to_string()),
            actor_id,
            auction_id: None,
            success: true,
            code: None,
            error_message: None,
            timestamp,
        }
    }

    pub fn failure(
        action: &str,
        resource_type: &str,
        resource_id: impl ToString,
        actor_id: Option<UserId>,
        code: &str,
        error_message: String,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            action: action.to_string(),
            resource_type: resource_type.to_string(),
            resource_id: Some(resource_id.to_string()),
            actor_id,
            auction_id: None,
            success: false,
            code: Some(code.to_string()),
            error_message: Some(error_message),
            timestamp,
        }
    }

    /// 관련 경매 태그 (입찰/취소 기록을 경매 기준으로 묶기 위함)
    pub fn for_auction(mut self, auction_id: Option<AuctionId>) -> Self {
        self.auction_id = auction_id;
        self
    }
}
// endregion: --- Audit Event

// region:    --- Audit Log Trait
#[async_trait]
pub trait AuditLog: Send + Sync {
    async fn log_event(&self, event: AuditEvent) -> Result<(), String>;
}

/// 별도 태스크에서 감사 로그 기록. 호출자는 기다리지 않는다.
pub fn dispatch(audit: &Arc<dyn AuditLog>, event: AuditEvent) {
    let audit = Arc::clone(audit);
    tokio::spawn(async move {
        let action = event.action.clone();
        if let Err(e) = audit.log_event(event).await {
            warn!("{:<12} --> 감사 로그 기록 실패 ({}): {}", "Audit", action, e);
        }
    });
}
// endregion: --- Audit Log Trait

// region:    --- Implementations
/// tracing 으로만 남기는 감사 로그
#[derive(Debug, Default)]
pub struct TracingAuditLog;

#[async_trait]
impl AuditLog for TracingAuditLog {
    async fn log_event(&self, event: AuditEvent) -> Result<(), String> {
        info!(
            "{:<12} --> action={} resource={}:{} auction={:?} actor={:?} success={} code={:?}",
            "Audit",
            event.action,
            event.resource_type,
            event.resource_id.as_deref().unwrap_or("-"),
            event.auction_id,
            event.actor_id,
            event.success,
            event.code
        );
        Ok(())
    }
}

/// audit_logs 테이블에 기록
pub struct PostgresAuditLog {
    pool: Arc<PgPool>,
}

impl PostgresAuditLog {
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AuditLog for PostgresAuditLog {
    async fn log_event(&self, event: AuditEvent) -> Result<(), String> {
        sqlx::query(queries::INSERT_AUDIT_LOG)
            .bind(&event.action)
            .bind(&event.resource_type)
            .bind(&event.resource_id)
            .bind(event.actor_id)
            .bind(event.auction_id)
            .bind(event.success)
            .bind(&event.code)
            .bind(&event.error_message)
            .bind(event.timestamp)
            .execute(&*self.pool)
            .await
            .map_err(|e| e.to_string())?;
        Ok(())
    }
}

/// 기록된 이벤트를 채널로 흘려보내는 감사 로그
pub struct RecordingAuditLog {
    tx: mpsc::UnboundedSender<AuditEvent>,
}

impl RecordingAuditLog {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<AuditEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

#[async_trait]
impl AuditLog for RecordingAuditLog {
    async fn log_event(&self, event: AuditEvent) -> Result<(), String> {
        self.tx.send(event).map_err(|e| e.to_string())
    }
}
// endregion: --- Implementations
