//! Flow Membership - Payment gateway integration for membership billing
//!
//! This crate signs requests to the Flow payment gateway, creates customers,
//! plans and subscriptions, and reconciles subscription state into
//! membership activations and downgrades.

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
