pub mod auth;
pub mod config;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod query;
pub mod server;
pub mod services;
pub mod status;
pub mod store;

#[cfg(test)]
pub mod testing;
