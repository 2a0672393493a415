pub mod auth;
pub mod cache;
pub mod db;
pub mod notifications;
pub mod server;
pub mod version;
pub mod web;
