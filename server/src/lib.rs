pub mod catalog;
pub mod config;
pub mod db;
pub mod environment;
pub mod errors;
pub mod film;
pub mod label;
pub mod routes;
pub mod social;
pub mod user;
