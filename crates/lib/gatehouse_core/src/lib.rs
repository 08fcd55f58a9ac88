//! # gatehouse_core
//!
//! Core token lifecycle logic for Gatehouse: signed access/refresh tokens,
//! credential persistence, and the login/refresh/logout flows that tie them
//! together.

pub mod auth;
pub mod config;
pub mod migrate;
pub mod models;
pub mod store;
