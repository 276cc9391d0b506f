pub mod aggregate;
pub mod cache;
pub mod client;
pub mod config;
pub mod models;
pub mod nav;
pub mod progress;
pub mod repo;
pub mod report;
pub mod samples;
pub mod view;
