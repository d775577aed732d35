pub mod export;
pub mod formatter;
pub mod generator;
pub mod history;
pub mod parser;
pub mod render;
pub mod trip_data;

pub use generator::{BriefError, BriefOrchestrator, BriefSettings, GeneratedBrief, GenerationGuard, GenerationOutcome};
pub use parser::parse_brief;
pub use render::{render_document, Branding};
pub use trip_data::TripDataResolver;
