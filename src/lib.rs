pub mod agent;
pub mod alerts;
pub mod config;
pub mod device;
pub mod entities;
pub mod hvac;
pub mod metrics;
pub mod migrator;
pub mod notifications;
pub mod telemetry;
pub mod worker;

pub use redis;
pub use sea_orm;
