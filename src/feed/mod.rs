//! Live activity feed: socket connector, normalizer, rolling buffer and the
//! view binding that ties them together.

pub mod buffer;
pub mod connector;
pub mod endpoint;
pub mod events;
pub mod normalize;
pub mod view;

pub use buffer::{EventBuffer, FEED_CAPACITY};
pub use connector::{ConnectionHandle, ConnectionState, FeedConnector};
pub use endpoint::ws_url;
pub use events::FeedEvent;
pub use normalize::{normalize, DisplayEntry};
pub use view::{FeedView, ViewState};
