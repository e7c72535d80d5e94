pub mod events;
pub mod metrics;
pub mod streaks;
pub mod subjects;
