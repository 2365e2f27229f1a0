//! Push token registration.

use serde::Deserialize;
use validator::Validate;

/// Request payload for storing the owner's FCM registration token.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct RegisterPushTokenRequest {
    #[validate(length(
        min = 1,
        max = 4096,
        message = "fcm_token must be between 1 and 4096 characters"
    ))]
    pub fcm_token: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_token_rejected() {
        let req: RegisterPushTokenRequest =
            serde_json::from_str(r#"{"fcm_token": ""}"#).unwrap();
        assert!(req.validate().is_err());
    }

    #[test]
    fn test_token_accepted() {
        let req: RegisterPushTokenRequest =
            serde_json::from_str(r#"{"fcm_token": "dGVzdC10b2tlbg"}"#).unwrap();
        assert!(req.validate().is_ok());
    }
}
