//! HTTP route handlers.

pub mod alerts;
pub mod devices;
pub mod geofences;
pub mod health;
pub mod locations;
pub mod users;

use serde::Serialize;

/// Success envelope: `{"data": ...}`.
#[derive(Debug, Serialize)]
pub struct DataResponse<T> {
    pub data: T,
}

impl<T> DataResponse<T> {
    pub fn new(data: T) -> Self {
        Self { data }
    }
}

/// Plain acknowledgement: `{"message": ...}`.
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}
