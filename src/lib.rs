pub mod auction;
pub mod audit;
pub mod auth;
pub mod bidding;
pub mod clock;
pub mod config;
pub mod database;
pub mod event_bus;
pub mod handlers;
#[cfg(feature = "kafka")]
pub mod message_broker;
pub mod scheduler;
pub mod store;
