pub mod activity_log;
pub mod badge_state;
pub mod dashboard;
pub mod metrics_store;
pub mod stats_store;
pub mod volume_series;

pub use activity_log::ActivityLog;
pub use badge_state::BadgeState;
pub use dashboard::Dashboard;
pub use metrics_store::MetricsStore;
pub use stats_store::StatsStore;
pub use volume_series::VolumeSeries;
