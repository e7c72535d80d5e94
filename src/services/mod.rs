pub mod activity;
pub mod analytics;
pub mod classifier;
pub mod llm_provider;
pub mod performance;
pub mod recommendation;
pub mod streak;
