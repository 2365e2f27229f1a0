//! Domain layer for the PetSafe backend.
//!
//! This crate contains:
//! - Domain models (Device, Location, Geofence, Alert) and their request DTOs
//! - The storage-access capability (`TrackingStore`) and an in-memory implementation
//! - Business logic services, including the location ingest pipeline
//! - Domain error types

pub mod error;
pub mod models;
pub mod services;
pub mod store;

pub use error::DomainError;
pub use store::{StoreError, TrackingStore};
