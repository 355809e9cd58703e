use crate::auth::MIN_PASSWORD_LENGTH;
use crate::server::response::ApiError;

const MAX_CAFE_NAME_LEN: usize = 100;
const MAX_REWARD_LEN: usize = 200;
const MAX_STAMPS_REQUIRED: i32 = 50;

/// Trims an optional text field; blank input counts as absent.
#[must_use]
pub fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Emails are compared case-insensitively.
#[must_use]
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

pub fn validate_email(email: &str) -> Result<(), ApiError> {
    let email = email.trim();
    if email.is_empty() || !email.contains('@') {
        return Err(ApiError::bad_request("Please enter a valid email address"));
    }
    Ok(())
}

pub fn validate_password(password: &str) -> Result<(), ApiError> {
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(ApiError::bad_request(format!(
            "Password must be at least {MIN_PASSWORD_LENGTH} characters"
        )));
    }
    Ok(())
}

pub fn validate_cafe_name(name: &str) -> Result<(), ApiError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(ApiError::bad_request("Please enter your cafe name"));
    }
    if name.chars().count() > MAX_CAFE_NAME_LEN {
        return Err(ApiError::bad_request(format!(
            "Cafe name cannot exceed {MAX_CAFE_NAME_LEN} characters"
        )));
    }
    Ok(())
}

pub fn validate_stamps_required(stamps_required: i32) -> Result<(), ApiError> {
    if !(1..=MAX_STAMPS_REQUIRED).contains(&stamps_required) {
        return Err(ApiError::bad_request(format!(
            "Stamps required must be between 1 and {MAX_STAMPS_REQUIRED}"
        )));
    }
    Ok(())
}

pub fn validate_reward_description(reward: &str) -> Result<(), ApiError> {
    let reward = reward.trim();
    if reward.is_empty() {
        return Err(ApiError::bad_request("Please describe the reward"));
    }
    if reward.chars().count() > MAX_REWARD_LEN {
        return Err(ApiError::bad_request(format!(
            "Reward description cannot exceed {MAX_REWARD_LEN} characters"
        )));
    }
    Ok(())
}
