pub mod api;
pub mod cache;
pub mod config;
pub mod error;
pub mod sim;
pub mod state;
pub mod storage;
pub mod ticker;
pub mod types;
pub mod ws;
