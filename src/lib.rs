pub mod automation;
pub mod catalog;
pub mod config;
pub mod flow;
pub mod hierarchy;
pub mod orchestrator;
pub mod preferences;
pub mod reservation;
pub mod shared;
pub mod status;
pub mod store;
