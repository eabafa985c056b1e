// region:    --- Imports
use auction_bidding::auction::admin::AuctionAdmin;
use auction_bidding::audit::{AuditLog, PostgresAuditLog, TracingAuditLog};
use auction_bidding::bidding::commands::BiddingService;
use auction_bidding::bidding::cooldown::CooldownGate;
use auction_bidding::clock::{Clock, SystemClock};
use auction_bidding::config::{AppConfig, StoreBackend};
use auction_bidding::database::DatabaseManager;
use auction_bidding::event_bus::{BidEventPublisher, BroadcastPublisher};
use auction_bidding::handlers::{self, AppState};
use auction_bidding::scheduler::StatusScheduler;
use auction_bidding::store::{AuctionStore, MemoryStore, PostgresStore};
use axum::extract::DefaultBodyLimit;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tracing::{error, info};
// endregion: --- Imports

// region:    --- Main
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // logging 초기화
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .without_time()
        .with_target(false)
        .init();

    let config = AppConfig::from_env()?;
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);

    // 저장소 및 감사 로그 구성
    let (store, audit): (Arc<dyn AuctionStore>, Arc<dyn AuditLog>) = match config.store_backend {
        StoreBackend::Postgres => {
            let database_url = config.database_url.as_deref().unwrap_or_default();
            let db_manager =
                Arc::new(DatabaseManager::connect(database_url, config.db_max_connections).await?);

            // 데이터베이스 초기화
            if let Err(e) = db_manager.initialize_database().await {
                error!("{:<12} --> 데이터베이스 초기화 실패: {:?}", "Main", e);
                return Err(e.into());
            }
            info!("{:<12} --> 데이터베이스 초기화 성공", "Main");

            (
                Arc::new(PostgresStore::new(Arc::clone(&db_manager))) as Arc<dyn AuctionStore>,
                Arc::new(PostgresAuditLog::new(db_manager.get_pool())) as Arc<dyn AuditLog>,
            )
        }
        StoreBackend::Memory => {
            info!("{:<12} --> 메모리 저장소 사용", "Main");
            (
                Arc::new(MemoryStore::new()) as Arc<dyn AuctionStore>,
                Arc::new(TracingAuditLog) as Arc<dyn AuditLog>,
            )
        }
    };

    let publisher = build_publisher(&config).await?;

    let bidding = BiddingService::new(
        Arc::clone(&store),
        Arc::clone(&clock),
        Arc::clone(&audit),
        Arc::clone(&publisher),
    )
    .with_cooldown(CooldownGate::new(chrono::Duration::hours(
        config.cooldown_hours,
    )));
    let admin = AuctionAdmin::new(
        Arc::clone(&store),
        Arc::clone(&clock),
        Arc::clone(&audit),
        Arc::clone(&publisher),
    );

    // 상태 힌트 동기화 스케줄러
    StatusScheduler::new(
        Arc::clone(&store),
        Arc::clone(&clock),
        config.status_sync_interval,
    )
    .start();

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // 라우터 설정
    let routes_all = handlers::routes(AppState {
        bidding: Arc::new(bidding),
        admin: Arc::new(admin),
        store,
        clock,
        retry: config.retry,
    })
    .layer(cors)
    .layer(DefaultBodyLimit::max(1024 * 1024));

    let listener = TcpListener::bind(&config.bind_addr).await?;
    info!(
        "{:<12} --> Web Server: Listening on {}",
        "Main",
        listener.local_addr()?
    );

    // 서버 실행
    if let Err(err) = axum::serve(listener, routes_all.into_make_service()).await {
        error!("{:<12} --> Server error: {}", "Main", err);
    }
    Ok(())
}

#[cfg(not(feature = "kafka"))]
async fn build_publisher(
    _config: &AppConfig,
) -> Result<Arc<dyn BidEventPublisher>, Box<dyn std::error::Error>> {
    Ok(Arc::new(BroadcastPublisher::new(1024)))
}

#[cfg(feature = "kafka")]
async fn build_publisher(
    config: &AppConfig,
) -> Result<Arc<dyn BidEventPublisher>, Box<dyn std::error::Error>> {
    use auction_bidding::event_bus::FanoutPublisher;
    use auction_bidding::message_broker::KafkaProducer;

    let local: Arc<dyn BidEventPublisher> = Arc::new(BroadcastPublisher::new(1024));
    let Some(brokers) = config.kafka_brokers.as_deref() else {
        return Ok(local);
    };

    let producer = KafkaProducer::new(brokers, &config.kafka_topic)?;
    producer.create_topic(5, 1).await?;
    info!("{:<12} --> Kafka 초기화 성공", "Main");

    Ok(Arc::new(FanoutPublisher::new(vec![
        local,
        Arc::new(producer) as Arc<dyn BidEventPublisher>,
    ])))
}
// endregion: --- Main
