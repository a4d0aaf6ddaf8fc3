pub mod health;
pub mod latency;
pub mod routes;
pub mod stream;

pub use routes::{router, ApiState};
