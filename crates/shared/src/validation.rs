//! Common validation utilities.
//!
//! Each function is usable directly or as a `validator` custom check.

use validator::ValidationError;

fn range_error(code: &'static str, message: &'static str) -> ValidationError {
    let mut err = ValidationError::new(code);
    err.message = Some(message.into());
    err
}

/// Validates that a latitude value is within valid range (-90 to 90).
pub fn validate_latitude(lat: f64) -> Result<(), ValidationError> {
    if (-90.0..=90.0).contains(&lat) {
        Ok(())
    } else {
        Err(range_error(
            "latitude_range",
            "Latitude must be between -90 and 90",
        ))
    }
}

/// Validates that a longitude value is within valid range (-180 to 180).
pub fn validate_longitude(lon: f64) -> Result<(), ValidationError> {
    if (-180.0..=180.0).contains(&lon) {
        Ok(())
    } else {
        Err(range_error(
            "longitude_range",
            "Longitude must be between -180 and 180",
        ))
    }
}

/// Validates that accuracy is non-negative.
pub fn validate_accuracy(accuracy: f32) -> Result<(), ValidationError> {
    if accuracy >= 0.0 {
        Ok(())
    } else {
        Err(range_error("accuracy_range", "Accuracy must be non-negative"))
    }
}

/// Validates that heading is within valid range (0 to 360).
pub fn validate_heading(heading: f32) -> Result<(), ValidationError> {
    if (0.0..=360.0).contains(&heading) {
        Ok(())
    } else {
        Err(range_error(
            "heading_range",
            "Heading must be between 0 and 360",
        ))
    }
}

/// Validates that speed is non-negative.
pub fn validate_speed(speed: f32) -> Result<(), ValidationError> {
    if speed >= 0.0 {
        Ok(())
    } else {
        Err(range_error("speed_range", "Speed must be non-negative"))
    }
}

/// Validates that a geofence radius is at least one meter.
pub fn validate_radius(radius_m: i32) -> Result<(), ValidationError> {
    if radius_m >= 1 {
        Ok(())
    } else {
        Err(range_error("radius_range", "Radius must be at least 1 meter"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_latitude() {
        assert!(validate_latitude(0.0).is_ok());
        assert!(validate_latitude(90.0).is_ok());
        assert!(validate_latitude(-90.0).is_ok());
        assert!(validate_latitude(45.123456).is_ok());
        assert!(validate_latitude(90.1).is_err());
        assert!(validate_latitude(-90.1).is_err());
    }

    #[test]
    fn test_validate_latitude_error_message() {
        let err = validate_latitude(100.0).unwrap_err();
        assert_eq!(err.code, "latitude_range");
        assert_eq!(
            err.message.unwrap().to_string(),
            "Latitude must be between -90 and 90"
        );
    }

    #[test]
    fn test_validate_longitude() {
        assert!(validate_longitude(0.0).is_ok());
        assert!(validate_longitude(180.0).is_ok());
        assert!(validate_longitude(-180.0).is_ok());
        assert!(validate_longitude(180.1).is_err());
        assert!(validate_longitude(-180.1).is_err());
    }

    #[test]
    fn test_validate_accuracy() {
        assert!(validate_accuracy(0.0).is_ok());
        assert!(validate_accuracy(12.5).is_ok());
        assert!(validate_accuracy(-0.1).is_err());
    }

    #[test]
    fn test_validate_heading() {
        assert!(validate_heading(0.0).is_ok());
        assert!(validate_heading(359.9).is_ok());
        assert!(validate_heading(360.0).is_ok());
        assert!(validate_heading(360.1).is_err());
        assert!(validate_heading(-1.0).is_err());
    }

    #[test]
    fn test_validate_speed() {
        assert!(validate_speed(0.0).is_ok());
        assert!(validate_speed(3.2).is_ok());
        assert!(validate_speed(-0.5).is_err());
    }

    #[test]
    fn test_validate_radius() {
        assert!(validate_radius(1).is_ok());
        assert!(validate_radius(500).is_ok());
        assert!(validate_radius(0).is_err());
        assert!(validate_radius(-10).is_err());
    }

    #[test]
    fn test_nan_coordinates_rejected() {
        assert!(validate_latitude(f64::NAN).is_err());
        assert!(validate_longitude(f64::NAN).is_err());
    }
}
