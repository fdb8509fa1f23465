//! Request handlers

pub mod accounts;
pub mod auth;
pub mod expenses;
pub mod health;
pub mod stats;
pub mod transactions;
