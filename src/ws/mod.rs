//! Client side of the `/stream` snapshot feed.

pub mod connection;
pub mod messages;

pub use connection::{stream_url, FeedHandle, FeedStatus, SnapshotFeed};
