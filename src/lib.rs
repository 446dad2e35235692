pub mod app;
pub mod config;
pub mod domain;
pub mod drive;
pub mod error;
pub mod http;
pub mod output;
pub mod store;
