//! Concrete backends for the supervisor's collaborator interfaces

pub mod memory;
pub mod postgres;
pub mod webhook;

pub use memory::MemoryKv;
pub use postgres::PostgresKv;
pub use webhook::WebhookChannel;
