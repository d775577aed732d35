pub mod models;
pub mod pii;

pub use models::brief::{BriefContent, BriefHistoryEntry, BriefRecord, PromptType, StructuredBrief, TripData};
pub use models::session::{CheckoutPlan, PendingSession, PlanType};
pub use models::trip::{Budget, Destination, PassportCountry, Persona, TripDraft, TripDraftPatch, Upload};
