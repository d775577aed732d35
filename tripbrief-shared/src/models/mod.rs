pub mod brief;
pub mod events;
pub mod session;
pub mod trip;
