pub mod analyzer;
pub mod config;
pub mod health;
pub mod keychain;
pub mod models;
