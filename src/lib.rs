pub mod api;
pub mod auth;
pub mod config;
pub mod feed;
pub mod logging;
pub mod panels;
pub mod stats;
