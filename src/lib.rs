//! PolePass - premium pass checkout backend for PoleGuessr
//!
//! This library provides the core functionality for the PolePass backend:
//! Stripe checkout session creation, signed webhook confirmation handling,
//! and the premium entitlement store.

pub mod config;
pub mod db;
pub mod error;
pub mod extractors;
pub mod handlers;
pub mod models;
pub mod payments;
