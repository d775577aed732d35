pub mod journey;
pub mod mock;
pub mod orchestrator;
pub mod subscription;

pub use journey::{Journey, JourneyError, JourneyState};
pub use mock::MockPaymentGateway;
pub use orchestrator::{CheckoutError, CheckoutOrchestrator, CreatedSession};
pub use subscription::{SubscriptionService, SubscriptionStatus};
