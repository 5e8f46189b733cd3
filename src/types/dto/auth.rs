use poem_openapi::{Multipart, Object, types::multipart::Upload};
use serde::{Deserialize, Serialize};
use validator::Validate;

use super::user::UserProfile;

/// Login with email or username
#[derive(Object, Debug, Serialize, Deserialize, Validate)]
pub struct LoginRequest {
    /// Email address or username
    #[validate(length(min = 1, max = 255, message = "The email field is required and may not exceed 255 characters."))]
    pub email: String,

    #[validate(length(min = 6, message = "The password must be at least 6 characters."))]
    pub password: String,

    #[validate(length(max = 255, message = "The device name may not exceed 255 characters."))]
    pub device_name: Option<String>,

    /// Terminate an existing session on another device
    #[oai(default)]
    #[serde(default)]
    pub force_logout: bool,
}

#[derive(Object, Debug)]
pub struct LoginData {
    pub user: UserProfile,
    pub token: String,
    pub token_type: String,
    /// Seconds until the token expires
    pub expires_in: i64,
}

#[derive(Object, Debug)]
pub struct LoginResponse {
    pub success: bool,
    pub message: String,
    pub data: LoginData,
}

/// Device details of the session blocking a login
#[derive(Object, Debug, Clone)]
pub struct ExistingSessionInfo {
    pub device_name: String,
    pub ip_address: Option<String>,
    pub last_activity: String,
}

/// 409 body returned when another device holds the session
#[derive(Object, Debug)]
pub struct SessionConflictResponse {
    pub success: bool,
    pub message: String,
    pub error: String,
    pub requires_force_logout: bool,
    pub existing_session: ExistingSessionInfo,
}

#[derive(Object, Debug)]
pub struct TokenData {
    pub token: String,
    pub token_type: String,
    pub expires_in: i64,
}

#[derive(Object, Debug)]
pub struct TokenResponse {
    pub success: bool,
    pub message: String,
    pub data: TokenData,
}

#[derive(Object, Debug)]
pub struct CheckSessionData {
    /// Whether the presented token is bound to the live session
    pub active: bool,
    #[oai(skip_serializing_if_is_none)]
    pub session: Option<ExistingSessionInfo>,
}

#[derive(Object, Debug)]
pub struct CheckSessionResponse {
    pub success: bool,
    pub message: String,
    pub data: CheckSessionData,
}

#[derive(Object, Debug, Serialize, Deserialize, Validate)]
pub struct ChangePasswordRequest {
    pub current_password: String,

    #[validate(
        length(min = 8, message = "The new password must be at least 8 characters."),
        custom(function = "crate::providers::validation_provider::validate_password_strength"),
        must_match(other = "new_password_confirmation", message = "The new password confirmation does not match.")
    )]
    pub new_password: String,

    pub new_password_confirmation: String,
}

#[derive(Object, Debug, Serialize, Deserialize, Validate)]
pub struct UpdateProfileRequest {
    #[validate(length(min = 1, max = 255, message = "The name may not exceed 255 characters."))]
    pub name: Option<String>,

    #[validate(length(min = 1, max = 100, message = "The username may not exceed 100 characters."))]
    pub username: Option<String>,

    #[validate(email(message = "The email must be a valid email address."))]
    pub email: Option<String>,

    #[validate(length(max = 20, message = "The phone may not exceed 20 characters."))]
    pub phone: Option<String>,
}

/// Multipart avatar upload
#[derive(Multipart)]
pub struct AvatarUpload {
    pub avatar: Upload,
}

#[derive(Object, Debug)]
pub struct AvatarData {
    pub avatar: Option<String>,
    pub avatar_url: Option<String>,
}

#[derive(Object, Debug)]
pub struct AvatarResponse {
    pub success: bool,
    pub message: String,
    pub data: AvatarData,
}

#[derive(Object, Debug, Serialize, Deserialize, Validate)]
pub struct RequestPasswordResetRequest {
    #[validate(email(message = "The email must be a valid email address."))]
    pub email: String,
}

#[derive(Object, Debug, Serialize, Deserialize, Validate)]
pub struct VerifyPasswordResetRequest {
    #[validate(email(message = "The email must be a valid email address."))]
    pub email: String,

    #[validate(length(equal = 6, message = "The otp must be 6 characters."))]
    pub otp: String,
}

#[derive(Object, Debug, Serialize, Deserialize, Validate)]
pub struct ResetPasswordRequest {
    #[validate(email(message = "The email must be a valid email address."))]
    pub email: String,

    #[validate(length(equal = 6, message = "The otp must be 6 characters."))]
    pub otp: String,

    #[validate(
        length(min = 8, message = "The password must be at least 8 characters."),
        must_match(other = "password_confirmation", message = "The password confirmation does not match.")
    )]
    pub password: String,

    pub password_confirmation: String,
}
