/// Kafka 로 경매 이벤트 발행 (feature = "kafka")
// region:    --- Imports
use crate::auction::events::AuctionEvent;
use crate::event_bus::BidEventPublisher;
use async_trait::async_trait;
use rdkafka::admin::{AdminClient, AdminOptions, NewTopic, TopicReplication};
use rdkafka::client::DefaultClientContext;
use rdkafka::error::KafkaError;
use rdkafka::producer::{FutureProducer, FutureRecord};
use rdkafka::ClientConfig;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info};

// endregion: --- Imports

// region:    --- Kafka Producer
#[derive(Clone)]
pub struct KafkaProducer {
    producer: Arc<FutureProducer>,
    brokers: String,
    topic: String,
}

/// KafkaProducer 구현
impl KafkaProducer {
    pub fn new(brokers: &str, topic: &str) -> Result<Self, KafkaError> {
        let producer: FutureProducer = ClientConfig::new()
            .set("bootstrap.servers", brokers)
            .set("message.timeout.ms", "5000")
            .create()?;

        Ok(KafkaProducer {
            producer: Arc::new(producer),
            brokers: brokers.to_string(),
            topic: topic.to_string(),
        })
    }

    /// 메시지 전송
    pub async fn send_message(&self, key: &str, value: &str) -> Result<(), String> {
        info!(
            "{:<12} --> Kafka 메시지 전송: topic={}, key={}",
            "Producer", self.topic, key
        );
        let record = FutureRecord::to(&self.topic).key(key).payload(value);

        self.producer
            .send(record, Duration::from_secs(0))
            .await
            .map_err(|(e, _)| format!("Error sending message: {:?}", e))?;

        Ok(())
    }

    /// 토픽 생성 (이미 있으면 그대로 둔다)
    pub async fn create_topic(
        &self,
        num_partitions: i32,
        replication_factor: i32,
    ) -> Result<(), String> {
        info!("{:<12} --> Kafka 토픽 생성 시작: {}", "Manager", self.topic);

        let admin_client: AdminClient<DefaultClientContext> = ClientConfig::new()
            .set("bootstrap.servers", &self.brokers)
            .create()
            .map_err(|e| format!("AdminClient 생성 실패: {:?}", e))?;

        let new_topic = NewTopic::new(
            &self.topic,
            num_partitions,
            TopicReplication::Fixed(replication_factor),
        );

        match admin_client
            .create_topics(&[new_topic], &AdminOptions::new())
            .await
        {
            Ok(_) => {
                info!("{:<12} --> Kafka 토픽 생성 성공: {}", "Manager", self.topic);
                Ok(())
            }
            Err(e) => {
                error!("{:<12} --> Kafka 토픽 생성 실패: {:?}", "Manager", e);
                Err(format!("토픽 생성 실패: {:?}", e))
            }
        }
    }
}

/// 경매 id 를 키로 사용해 같은 경매의 이벤트 순서를 파티션 안에서 유지한다
#[async_trait]
impl BidEventPublisher for KafkaProducer {
    async fn publish(&self, event: AuctionEvent) -> Result<(), String> {
        let payload = serde_json::to_string(&event).map_err(|e| e.to_string())?;
        self.send_message(&event.auction_id().to_string(), &payload)
            .await
    }
}
// endregion: --- Kafka Producer
