//! Shared utilities and common types for the PetSafe backend.
//!
//! This crate provides common functionality used across all other crates:
//! - Great-circle distance (the geofence distance engine)
//! - Common validation logic
//! - JWT verification for owner-authenticated routes
//! - Keyset cursor encoding

pub mod geo;
pub mod jwt;
pub mod pagination;
pub mod validation;
