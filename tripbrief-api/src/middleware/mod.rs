pub mod client;
pub mod resiliency;

pub use client::{client_id_middleware, CLIENT_ID_HEADER};
pub use resiliency::{circuit_breaker_middleware, CircuitBreaker, CircuitState, ResiliencyState};
