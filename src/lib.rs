pub mod address;
pub mod app;
pub mod cli;
pub mod config;
pub mod db;
pub mod dialer;
pub mod models;
pub mod storage;
pub mod store;

pub use db::Database;
