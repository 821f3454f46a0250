//! Moni Backend Library
//!
//! Loan request intake, an external eligibility check and the staff
//! administration API built on top of it.

pub mod app;
pub mod auth;
pub mod config;
pub mod db;
pub mod eligibility;
pub mod error;
pub mod handlers;
pub mod loan_service;
pub mod middleware;
pub mod models;
pub mod policy;
pub mod routes;
pub mod seed;
pub mod state;
pub mod store;
