//! Leave management backend for ISET Jendouba.

pub mod api;
pub mod auth;
pub mod config;
pub mod db;
pub mod docs;
pub mod error;
pub mod leave;
pub mod model;
pub mod models;
pub mod routes;
pub mod store;
