use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::{
    config::Config,
    errors::{AppError, AppResult, AuthError},
    models::domain::{AuthSession, AuthUser, UserType},
};

pub struct NewUser<'a> {
    pub username: &'a str,
    pub email: &'a str,
    pub password: &'a str,
    pub user_type: UserType,
}

#[async_trait]
pub trait IdentityProvider: Send + Sync {
    async fn sign_up(&self, user: NewUser<'_>) -> AppResult<AuthUser>;
    async fn sign_in(&self, email: &str, password: &str) -> AppResult<(AuthUser, AuthSession)>;
    async fn current_user(&self, access_token: &str) -> AppResult<AuthUser>;
    async fn sign_out(&self, access_token: &str) -> AppResult<()>;
}

#[derive(Debug, Default, Deserialize)]
struct UserMetadata {
    username: Option<String>,
    user_type: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GoTrueUser {
    id: String,
    email: Option<String>,
    email_confirmed_at: Option<String>,
    created_at: Option<String>,
    #[serde(default)]
    user_metadata: Option<UserMetadata>,
}

impl From<GoTrueUser> for AuthUser {
    fn from(user: GoTrueUser) -> Self {
        let metadata = user.user_metadata.unwrap_or_default();
        AuthUser {
            id: user.id,
            email: user.email,
            username: metadata.username,
            user_type: metadata.user_type,
            email_verified: user.email_confirmed_at.is_some(),
            created_at: user.created_at,
        }
    }
}

#[derive(Debug, Deserialize)]
struct GoTrueSession {
    access_token: String,
    refresh_token: String,
    expires_at: Option<i64>,
    user: GoTrueUser,
}

impl GoTrueSession {
    fn into_parts(self) -> (AuthUser, AuthSession) {
        (
            self.user.into(),
            AuthSession {
                access_token: self.access_token,
                refresh_token: self.refresh_token,
                expires_at: self.expires_at,
            },
        )
    }
}

/// Sign-up answers with a bare user while email confirmation is pending and
/// with a full session otherwise.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum SignUpBody {
    Session(GoTrueSession),
    User(GoTrueUser),
}

/// Pulls the human readable message out of a GoTrue error body.
fn provider_message(body: &Value) -> Option<&str> {
    ["msg", "error_description", "message", "error"]
        .iter()
        .find_map(|key| body.get(*key).and_then(Value::as_str))
}

/// Supabase GoTrue REST client.
pub struct SupabaseIdentityProvider {
    http: reqwest::Client,
    base_url: String,
    api_key: SecretString,
}

impl SupabaseIdentityProvider {
    pub fn new(config: &Config) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: format!("{}/auth/v1", config.supabase_api_url.trim_end_matches('/')),
            api_key: config.supabase_api_key.clone(),
        }
    }

    fn request(&self, method: reqwest::Method, path: &str) -> reqwest::RequestBuilder {
        self.http
            .request(method, format!("{}{}", self.base_url, path))
            .header("apikey", self.api_key.expose_secret())
    }

    /// Decodes a success body, or turns the provider's error body into an
    /// [`AuthError`].
    async fn read<T: serde::de::DeserializeOwned>(response: reqwest::Response) -> AppResult<T> {
        let status = response.status();
        let body: Value = response.json().await.unwrap_or(Value::Null);

        if !status.is_success() {
            let message = provider_message(&body).unwrap_or("Authentication failed");
            log::warn!("Identity provider returned {}: {}", status, message);
            return Err(AuthError::from_provider_message(message).into());
        }

        serde_json::from_value(body).map_err(|e| {
            log::error!("Unexpected identity provider response: {}", e);
            AppError::UpstreamError("Unexpected identity provider response".to_string())
        })
    }
}

#[async_trait]
impl IdentityProvider for SupabaseIdentityProvider {
    async fn sign_up(&self, user: NewUser<'_>) -> AppResult<AuthUser> {
        let response = self
            .request(reqwest::Method::POST, "/signup")
            .json(&json!({
                "email": user.email,
                "password": user.password,
                "data": {
                    "username": user.username,
                    "user_type": user.user_type.as_str(),
                },
            }))
            .send()
            .await?;

        let created = match Self::read::<SignUpBody>(response).await? {
            SignUpBody::Session(session) => session.user.into(),
            SignUpBody::User(user) => user.into(),
        };
        Ok(created)
    }

    async fn sign_in(&self, email: &str, password: &str) -> AppResult<(AuthUser, AuthSession)> {
        let response = self
            .request(reqwest::Method::POST, "/token?grant_type=password")
            .json(&json!({ "email": email, "password": password }))
            .send()
            .await?;

        let session: GoTrueSession = Self::read(response).await?;
        Ok(session.into_parts())
    }

    async fn current_user(&self, access_token: &str) -> AppResult<AuthUser> {
        let response = self
            .request(reqwest::Method::GET, "/user")
            .bearer_auth(access_token)
            .send()
            .await?;

        let user: GoTrueUser = Self::read(response).await?;
        Ok(user.into())
    }

    async fn sign_out(&self, access_token: &str) -> AppResult<()> {
        let response = self
            .request(reqwest::Method::POST, "/logout")
            .bearer_auth(access_token)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            log::warn!("Identity provider logout returned {}", status);
        }
        Ok(())
    }
}
