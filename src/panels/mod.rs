//! Dashboard panels over the backend API. Each panel owns its API handle
//! and the state a screen would render.

pub mod behaviors;
pub mod images;
pub mod logs;

pub use behaviors::BehaviorPanel;
pub use images::ImagePanel;
pub use logs::LogsPanel;
