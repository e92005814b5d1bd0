// src/lib.rs
pub mod banner;
pub mod checks;
pub mod client;
pub mod config;
pub mod errors;
pub mod export;
pub mod models;
pub mod poller;
pub mod render;
pub mod summary;
