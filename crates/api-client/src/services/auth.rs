//! Authentication endpoints
//!
//! Credential exchanges (login, registration, OTP) are sent without a bearer
//! so a rejected password never triggers a session refresh. Successful
//! exchanges store the returned token pair and emit
//! [`SessionEvent::Created`](crate::session::SessionEvent::Created).

use crate::client::ApiClient;
use crate::error::Result;
use crate::http::ApiRequest;
use crate::models::{AuthResponse, User};
use crate::session::RefreshTokenBody;
use serde::de::IgnoredAny;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info, warn};

#[derive(Serialize)]
struct LoginRequest<'a> {
    email: &'a str,
    password: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct RegisterRequest<'a> {
    email: &'a str,
    password: &'a str,
    full_name: &'a str,
}

#[derive(Serialize)]
struct OtpRequest<'a> {
    email: &'a str,
}

#[derive(Serialize)]
struct VerifyOtpRequest<'a> {
    email: &'a str,
    otp: &'a str,
}

/// Auth endpoints, obtained from [`ApiClient::auth`]
pub struct AuthApi<'a> {
    client: &'a ApiClient,
}

impl<'a> AuthApi<'a> {
    pub(crate) fn new(client: &'a ApiClient) -> Self {
        Self { client }
    }

    /// Log in with email and password
    pub async fn login(&self, email: &str, password: &str) -> Result<AuthResponse> {
        let request = ApiRequest::post("/auth/login")
            .anonymous()
            .json_body(&LoginRequest { email, password })?;
        self.authenticate(request).await
    }

    /// Create an account and log in
    pub async fn register(
        &self,
        email: &str,
        password: &str,
        full_name: &str,
    ) -> Result<AuthResponse> {
        let request = ApiRequest::post("/auth/register")
            .anonymous()
            .json_body(&RegisterRequest { email, password, full_name })?;
        self.authenticate(request).await
    }

    /// Ask the backend to email a one-time password
    pub async fn request_otp(&self, email: &str) -> Result<Value> {
        let request =
            ApiRequest::post("/auth/login/request-otp").anonymous().json_body(&OtpRequest { email })?;
        Ok(self.client.send(request).await?.data)
    }

    /// Log in with a one-time password
    pub async fn verify_otp(&self, email: &str, otp: &str) -> Result<AuthResponse> {
        let request = ApiRequest::post("/auth/login/verify-otp")
            .anonymous()
            .json_body(&VerifyOtpRequest { email, otp })?;
        self.authenticate(request).await
    }

    /// Log out.
    ///
    /// The backend is told to revoke the refresh token on a best-effort
    /// basis; the local session is cleared whatever it answers.
    pub async fn logout(&self) -> Result<()> {
        match self.client.session().await {
            Ok(Some(session)) => {
                if let Some(refresh_token) = session.refresh() {
                    let request = ApiRequest::post("/auth/logout")
                        .json_body(&RefreshTokenBody { refresh_token })?;
                    if let Err(err) =
                        self.client.send_once::<IgnoredAny>(&request, session.bearer()).await
                    {
                        warn!(error = %err, "Logout request failed; clearing session anyway");
                    }
                }
            }
            Ok(None) => debug!("Logout without a stored session"),
            Err(err) => warn!(error = %err, "Could not read session during logout"),
        }

        self.client.end_session().await?;
        info!("Logged out");
        Ok(())
    }

    /// Fetch the authenticated user's profile
    pub async fn profile(&self) -> Result<User> {
        self.client.get("/auth/profile").await
    }

    /// Ask the backend whether the current access token is valid
    pub async fn validate_token(&self) -> Result<Value> {
        self.client.get("/auth/validate").await
    }

    /// Resume a stored session.
    ///
    /// Returns the profile when the stored tokens still work (refreshing
    /// them if needed). Any failure clears the session and yields `None`.
    pub async fn restore(&self) -> Result<Option<User>> {
        if !self.client.is_authenticated().await? {
            return Ok(None);
        }

        match self.profile().await {
            Ok(user) => {
                info!(user = %user.id, "Session restored");
                Ok(Some(user))
            }
            Err(err) => {
                warn!(error = %err, "Stored session is unusable; clearing it");
                self.client.clear_session().await?;
                Ok(None)
            }
        }
    }

    async fn authenticate(&self, request: ApiRequest) -> Result<AuthResponse> {
        let auth: AuthResponse = self.client.send(request).await?.data;
        self.client.establish_session(auth.session()).await?;
        info!(
            user = auth.user.as_ref().map(|u| u.id.as_str()).unwrap_or("unknown"),
            "Session established"
        );
        Ok(auth)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_register_body_uses_full_name_key() {
        let body = serde_json::to_value(RegisterRequest {
            email: "amina@example.com",
            password: "secret",
            full_name: "Amina Yusuf",
        })
        .unwrap();

        assert_eq!(
            body,
            json!({"email": "amina@example.com", "password": "secret", "fullName": "Amina Yusuf"})
        );
    }

    #[test]
    fn test_verify_otp_body() {
        let body = serde_json::to_value(VerifyOtpRequest { email: "e", otp: "123456" }).unwrap();
        assert_eq!(body, json!({"email": "e", "otp": "123456"}));
    }
}
