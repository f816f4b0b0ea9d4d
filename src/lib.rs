pub mod assignments;
pub mod audit;
pub mod auth;
pub mod config;
pub mod db;
pub mod errors;
pub mod handlers;
pub mod models;
pub mod schedule;
pub mod templates_structs;
