pub mod app_config;
pub mod memory;
pub mod platform;
pub mod redis_repo;
pub mod retry;

pub use memory::{MemoryClientStore, MemorySessionRepository};
pub use platform::PlatformClient;
pub use redis_repo::RedisClient;
pub use retry::RetryPolicy;
