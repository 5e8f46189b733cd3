use poem::Request;
use poem_openapi::{OpenApi, Tags, payload::Json};
use std::sync::Arc;

use crate::app_data::AppData;
use crate::coordinators::{
    AuthCoordinator, LoginAttempt, PasswordResetCoordinator, ProfileCoordinator,
};
use crate::errors::AuthError;
use crate::errors::InternalError;
use crate::providers::validation_provider::validate_request;
use crate::providers::{LimitedRoute, RateLimitProvider};
use crate::types::db::{unit, user};
use crate::types::dto::auth::{
    AvatarData, AvatarResponse, AvatarUpload, ChangePasswordRequest, CheckSessionData,
    CheckSessionResponse, ExistingSessionInfo, LoginData, LoginRequest, LoginResponse,
    RequestPasswordResetRequest, ResetPasswordRequest, TokenData, TokenResponse,
    UpdateProfileRequest, VerifyPasswordResetRequest,
};
use crate::types::dto::common::{MessageResponse, format_timestamp};
use crate::types::dto::user::{UserProfile, UserResponse, avatar_url};
use crate::types::internal::auth::{AuthenticatedSession, IssuedToken};
use crate::types::internal::context::RequestContext;

const TOKEN_TYPE: &str = "Bearer";

/// Authentication, session and profile endpoints
pub struct AuthApi {
    auth_coordinator: AuthCoordinator,
    profile_coordinator: ProfileCoordinator,
    password_reset_coordinator: PasswordResetCoordinator,
    rate_limiter: Arc<RateLimitProvider>,
    public_base: String,
    trust_proxy_headers: bool,
}

impl AuthApi {
    pub fn new(app_data: Arc<AppData>) -> Self {
        Self {
            auth_coordinator: AuthCoordinator::new(app_data.clone()),
            profile_coordinator: ProfileCoordinator::new(app_data.clone()),
            password_reset_coordinator: PasswordResetCoordinator::new(app_data.clone()),
            rate_limiter: app_data.rate_limiter.clone(),
            public_base: app_data.settings.storage_public_url().to_string(),
            trust_proxy_headers: app_data.settings.trust_proxy_headers(),
        }
    }

    fn throttle(&self, route: LimitedRoute, ctx: &RequestContext) -> Result<(), AuthError> {
        self.rate_limiter
            .check(route, &ctx.client_key())
            .map_err(AuthError::from_internal_error)
    }

    async fn authenticate(&self, req: &Request) -> Result<AuthenticatedSession, AuthError> {
        let ctx = RequestContext::from_request(req, self.trust_proxy_headers);
        self.auth_coordinator
            .authenticate(&ctx)
            .await
            .map_err(AuthError::from_internal_error)
    }

    fn profile(&self, user: &user::Model, unit: Option<&unit::Model>) -> UserProfile {
        UserProfile::from_model(user, unit, &self.public_base)
    }

    fn token_data(token: IssuedToken) -> TokenData {
        TokenData {
            token: token.token,
            token_type: TOKEN_TYPE.to_string(),
            expires_in: token.expires_in,
        }
    }
}

/// API tags for authentication endpoints
#[derive(Tags)]
enum AuthTags {
    /// Login, session and logout
    Authentication,
    /// OTP password reset
    PasswordReset,
    /// Self-service profile
    Profile,
}

#[OpenApi(prefix_path = "/auth")]
impl AuthApi {
    /// Login with email or username
    ///
    /// Returns 409 with the other device's details when the account already
    /// has a session; repeat with `force_logout: true` to take it over.
    #[oai(path = "/login", method = "post", tag = "AuthTags::Authentication")]
    async fn login(&self, req: &Request, body: Json<LoginRequest>) -> Result<Json<LoginResponse>, AuthError> {
        let ctx = RequestContext::from_request(req, self.trust_proxy_headers);
        self.throttle(LimitedRoute::Login, &ctx)?;
        validate_request(&body.0).map_err(AuthError::from_internal_error)?;

        let body = body.0;
        let outcome = self
            .auth_coordinator
            .login(
                &ctx,
                LoginAttempt {
                    identifier: body.email,
                    password: body.password,
                    device_name: body.device_name,
                    force_logout: body.force_logout,
                },
            )
            .await
            .map_err(AuthError::from_internal_error)?;

        let message = if outcome.took_over {
            "Login successful. Your session on the other device has been ended."
        } else {
            "Login successful."
        };
        Ok(Json(LoginResponse {
            success: true,
            message: message.to_string(),
            data: LoginData {
                user: self.profile(&outcome.user, outcome.unit.as_ref()),
                token: outcome.token.token,
                token_type: TOKEN_TYPE.to_string(),
                expires_in: outcome.token.expires_in,
            },
        }))
    }

    /// Report whether the presented token still owns the account's session
    #[oai(path = "/check-session", method = "post", tag = "AuthTags::Authentication")]
    async fn check_session(&self, req: &Request) -> Result<Json<CheckSessionResponse>, AuthError> {
        let ctx = RequestContext::from_request(req, self.trust_proxy_headers);
        self.throttle(LimitedRoute::CheckSession, &ctx)?;

        let status = self
            .auth_coordinator
            .check_session(&ctx)
            .await
            .map_err(AuthError::from_internal_error)?;

        Ok(Json(CheckSessionResponse {
            success: true,
            message: if status.active {
                "Session is active.".to_string()
            } else {
                "Session is not active.".to_string()
            },
            data: CheckSessionData {
                active: status.active,
                session: status.session.map(|s| ExistingSessionInfo {
                    device_name: s.device_name,
                    ip_address: s.ip_address,
                    last_activity: format_timestamp(s.last_activity),
                }),
            },
        }))
    }

    /// Current user with unit
    #[oai(path = "/me", method = "get", tag = "AuthTags::Authentication")]
    async fn me(&self, req: &Request) -> Result<Json<UserResponse>, AuthError> {
        let auth = self.authenticate(req).await?;
        let (user, unit) = self
            .auth_coordinator
            .me(&auth)
            .await
            .map_err(AuthError::from_internal_error)?;
        Ok(Json(UserResponse::ok(
            "User retrieved successfully.",
            self.profile(&user, unit.as_ref()),
        )))
    }

    /// Exchange the current token for a new one on the same session
    #[oai(path = "/refresh", method = "post", tag = "AuthTags::Authentication")]
    async fn refresh(&self, req: &Request) -> Result<Json<TokenResponse>, AuthError> {
        let auth = self.authenticate(req).await?;
        let token = self
            .auth_coordinator
            .refresh(&auth)
            .await
            .map_err(AuthError::from_internal_error)?;
        Ok(Json(TokenResponse {
            success: true,
            message: "Token refreshed successfully.".to_string(),
            data: Self::token_data(token),
        }))
    }

    /// End the current session
    #[oai(path = "/logout", method = "post", tag = "AuthTags::Authentication")]
    async fn logout(&self, req: &Request) -> Result<Json<MessageResponse>, AuthError> {
        let auth = self.authenticate(req).await?;
        self.auth_coordinator
            .logout(&auth)
            .await
            .map_err(AuthError::from_internal_error)?;
        Ok(Json(MessageResponse::ok("Logged out successfully.")))
    }

    /// Send a 6-digit reset code to the account's email
    #[oai(path = "/password/reset/request", method = "post", tag = "AuthTags::PasswordReset")]
    async fn request_password_reset(
        &self,
        req: &Request,
        body: Json<RequestPasswordResetRequest>,
    ) -> Result<Json<MessageResponse>, AuthError> {
        let ctx = RequestContext::from_request(req, self.trust_proxy_headers);
        self.throttle(LimitedRoute::PasswordResetRequest, &ctx)?;
        self.password_reset_coordinator
            .request(body.0)
            .await
            .map_err(AuthError::from_internal_error)?;
        Ok(Json(MessageResponse::ok("A password reset code has been sent to your email.")))
    }

    #[oai(path = "/password/reset/verify", method = "post", tag = "AuthTags::PasswordReset")]
    async fn verify_password_reset(
        &self,
        req: &Request,
        body: Json<VerifyPasswordResetRequest>,
    ) -> Result<Json<MessageResponse>, AuthError> {
        let ctx = RequestContext::from_request(req, self.trust_proxy_headers);
        self.throttle(LimitedRoute::PasswordResetVerify, &ctx)?;
        self.password_reset_coordinator
            .verify(body.0)
            .await
            .map_err(AuthError::from_internal_error)?;
        Ok(Json(MessageResponse::ok("The code has been verified.")))
    }

    #[oai(path = "/password/reset", method = "post", tag = "AuthTags::PasswordReset")]
    async fn reset_password(
        &self,
        req: &Request,
        body: Json<ResetPasswordRequest>,
    ) -> Result<Json<MessageResponse>, AuthError> {
        let ctx = RequestContext::from_request(req, self.trust_proxy_headers);
        self.throttle(LimitedRoute::PasswordReset, &ctx)?;
        self.password_reset_coordinator
            .reset(body.0)
            .await
            .map_err(AuthError::from_internal_error)?;
        Ok(Json(MessageResponse::ok("Your password has been reset. Please log in.")))
    }

    #[oai(path = "/profile", method = "put", tag = "AuthTags::Profile")]
    async fn update_profile(
        &self,
        req: &Request,
        body: Json<UpdateProfileRequest>,
    ) -> Result<Json<UserResponse>, AuthError> {
        let auth = self.authenticate(req).await?;
        let updated = self
            .profile_coordinator
            .update_profile(&auth, body.0)
            .await
            .map_err(AuthError::from_internal_error)?;
        let unit = self
            .auth_coordinator
            .unit_of(&updated)
            .await
            .map_err(AuthError::from_internal_error)?;
        Ok(Json(UserResponse::ok(
            "Profile updated successfully.",
            self.profile(&updated, unit.as_ref()),
        )))
    }

    #[oai(path = "/change-password", method = "put", tag = "AuthTags::Profile")]
    async fn change_password(
        &self,
        req: &Request,
        body: Json<ChangePasswordRequest>,
    ) -> Result<Json<MessageResponse>, AuthError> {
        let auth = self.authenticate(req).await?;
        self.profile_coordinator
            .change_password(&auth, body.0)
            .await
            .map_err(AuthError::from_internal_error)?;
        Ok(Json(MessageResponse::ok("Password changed successfully.")))
    }

    /// Upload a jpeg, png or gif avatar (max 2 MB, 2000x2000)
    #[oai(path = "/avatar", method = "post", tag = "AuthTags::Profile")]
    async fn upload_avatar(&self, req: &Request, upload: AvatarUpload) -> Result<Json<AvatarResponse>, AuthError> {
        let auth = self.authenticate(req).await?;

        let content_type = upload.avatar.content_type().map(str::to_string);
        let bytes = upload.avatar.into_vec().await.map_err(|e| {
            tracing::debug!("Reading avatar upload failed: {}", e);
            AuthError::from_internal_error(InternalError::validation(
                "avatar",
                "The avatar failed to upload.",
            ))
        })?;

        let updated = self
            .profile_coordinator
            .upload_avatar(&auth, content_type.as_deref(), bytes)
            .await
            .map_err(AuthError::from_internal_error)?;

        Ok(Json(AvatarResponse {
            success: true,
            message: "Avatar uploaded successfully.".to_string(),
            data: AvatarData {
                avatar_url: updated.avatar.as_deref().map(|p| avatar_url(&self.public_base, p)),
                avatar: updated.avatar,
            },
        }))
    }

    #[oai(path = "/avatar", method = "delete", tag = "AuthTags::Profile")]
    async fn delete_avatar(&self, req: &Request) -> Result<Json<MessageResponse>, AuthError> {
        let auth = self.authenticate(req).await?;
        self.profile_coordinator
            .delete_avatar(&auth)
            .await
            .map_err(AuthError::from_internal_error)?;
        Ok(Json(MessageResponse::ok("Avatar deleted successfully.")))
    }
}
