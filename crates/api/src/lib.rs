//! `stocky-api` — HTTP surface for the Stocky inventory service.

pub mod app;
pub mod context;
pub mod middleware;
