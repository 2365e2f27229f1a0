//! Location domain model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::error::DomainError;

/// An immutable GPS sample reported by a device.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub id: i64,
    pub device_id: i64,
    pub latitude: f64,
    pub longitude: f64,
    pub accuracy: Option<f32>,
    pub speed: Option<f32>,
    pub heading: Option<f32>,
    /// Device clock at capture time, as reported by the firmware.
    pub client_timestamp: i64,
    pub received_at: DateTime<Utc>,
}

/// Data required to append a location.
#[derive(Debug, Clone, PartialEq)]
pub struct NewLocation {
    pub device_id: i64,
    pub latitude: f64,
    pub longitude: f64,
    pub accuracy: Option<f32>,
    pub speed: Option<f32>,
    pub heading: Option<f32>,
    pub client_timestamp: i64,
    pub received_at: DateTime<Utc>,
}

/// Inbound location report.
///
/// Required fields are optional here so that a missing field is reported as a
/// validation error instead of a body rejection.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct LocationReport {
    #[validate(required(message = "device_id is required"))]
    pub device_id: Option<i64>,

    #[validate(
        required(message = "latitude is required"),
        custom(function = "shared::validation::validate_latitude")
    )]
    pub latitude: Option<f64>,

    #[validate(
        required(message = "longitude is required"),
        custom(function = "shared::validation::validate_longitude")
    )]
    pub longitude: Option<f64>,

    #[validate(custom(function = "shared::validation::validate_accuracy"))]
    pub accuracy: Option<f32>,

    #[validate(custom(function = "shared::validation::validate_speed"))]
    pub speed: Option<f32>,

    #[validate(custom(function = "shared::validation::validate_heading"))]
    pub heading: Option<f32>,

    /// Older firmware sends this as `updated_at`.
    #[serde(alias = "updated_at")]
    #[validate(required(message = "client_timestamp is required"))]
    pub client_timestamp: Option<i64>,
}

impl LocationReport {
    /// Validates the report and stamps it with the server receipt time.
    pub fn into_new_location(self, received_at: DateTime<Utc>) -> Result<NewLocation, DomainError> {
        self.validate()?;

        match (self.device_id, self.latitude, self.longitude, self.client_timestamp) {
            (Some(device_id), Some(latitude), Some(longitude), Some(client_timestamp)) => {
                Ok(NewLocation {
                    device_id,
                    latitude,
                    longitude,
                    accuracy: self.accuracy,
                    speed: self.speed,
                    heading: self.heading,
                    client_timestamp,
                    received_at,
                })
            }
            _ => Err(DomainError::Validation(
                "device_id, latitude, longitude and client_timestamp are required".to_string(),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn full_report() -> LocationReport {
        LocationReport {
            device_id: Some(7),
            latitude: Some(10.0),
            longitude: Some(10.0),
            accuracy: Some(5.0),
            speed: Some(1.2),
            heading: Some(90.0),
            client_timestamp: Some(1_700_000_000_000),
        }
    }

    #[test]
    fn test_report_converts_with_receipt_time() {
        let now = Utc::now();
        let new = full_report().into_new_location(now).unwrap();

        assert_eq!(new.device_id, 7);
        assert_eq!(new.latitude, 10.0);
        assert_eq!(new.heading, Some(90.0));
        assert_eq!(new.client_timestamp, 1_700_000_000_000);
        assert_eq!(new.received_at, now);
    }

    #[test]
    fn test_missing_required_fields_rejected() {
        for strip in 0..4 {
            let mut report = full_report();
            match strip {
                0 => report.device_id = None,
                1 => report.latitude = None,
                2 => report.longitude = None,
                _ => report.client_timestamp = None,
            }
            let result = report.into_new_location(Utc::now());
            assert!(
                matches!(result, Err(DomainError::Validation(_))),
                "field {} should be required",
                strip
            );
        }
    }

    #[test]
    fn test_optional_readings_may_be_absent() {
        let report = LocationReport {
            accuracy: None,
            speed: None,
            heading: None,
            ..full_report()
        };
        assert!(report.into_new_location(Utc::now()).is_ok());
    }

    #[test]
    fn test_zero_coordinates_are_present_values() {
        let report = LocationReport {
            latitude: Some(0.0),
            longitude: Some(0.0),
            ..full_report()
        };
        assert!(report.into_new_location(Utc::now()).is_ok());
    }

    #[test]
    fn test_out_of_range_values_rejected() {
        let cases = [
            LocationReport { latitude: Some(91.0), ..full_report() },
            LocationReport { longitude: Some(-180.5), ..full_report() },
            LocationReport { accuracy: Some(-1.0), ..full_report() },
            LocationReport { speed: Some(-0.1), ..full_report() },
            LocationReport { heading: Some(361.0), ..full_report() },
        ];
        for report in cases {
            assert!(report.into_new_location(Utc::now()).is_err());
        }
    }

    #[test]
    fn test_updated_at_alias_accepted() {
        let json = r#"{
            "device_id": 3,
            "latitude": -23.55,
            "longitude": -46.63,
            "updated_at": 1700000000
        }"#;
        let report: LocationReport = serde_json::from_str(json).unwrap();
        assert_eq!(report.client_timestamp, Some(1_700_000_000));
    }

    #[test]
    fn test_location_serializes_snake_case() {
        let location = Location {
            id: 1,
            device_id: 2,
            latitude: 1.0,
            longitude: 2.0,
            accuracy: None,
            speed: None,
            heading: None,
            client_timestamp: 99,
            received_at: Utc::now(),
        };
        let json = serde_json::to_value(&location).unwrap();
        assert_eq!(json["client_timestamp"], 99);
        assert!(json.get("received_at").is_some());
        assert!(json["accuracy"].is_null());
    }
}
