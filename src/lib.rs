//! Membership Billing - lifecycle and billing engine for fitness memberships.
//!
//! Prices plans with add-ons and interval discounts, and manages a
//! membership from purchase through freezing, extension, plan changes and
//! cancellation with prorated refunds.

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
