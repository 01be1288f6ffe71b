//! Fairway - referral attribution service
//!
//! Backend for the referral-based beta access program of the Fairway
//! golf-equipment community: members share referral codes, every
//! attributed signup bumps the referrer's counters, and every third
//! referral grants a bonus invite.
//!
//! # Architecture
//! - `api`: HTTP handlers, authentication, JWT
//! - `services`: the attribution flow itself
//! - `storage`: store trait and SeaORM backend
//! - `config`: configuration management
//! - `system`: logging and process-level utilities

pub mod api;
pub mod config;
pub mod errors;
pub mod services;
pub mod storage;
pub mod system;
pub mod utils;
