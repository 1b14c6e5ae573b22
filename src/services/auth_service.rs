use std::sync::Arc;

use validator::Validate;

use crate::{
    auth::{IdentityProvider, NewUser},
    errors::{AppError, AppResult},
    models::{
        domain::{AuthSession, AuthUser, UserType},
        dto::request::{LoginUserRequest, RegisterUserRequest},
    },
};

pub struct AuthService {
    provider: Arc<dyn IdentityProvider>,
}

impl AuthService {
    pub fn new(provider: Arc<dyn IdentityProvider>) -> Self {
        Self { provider }
    }

    pub async fn register(&self, request: RegisterUserRequest) -> AppResult<AuthUser> {
        request.validate()?;
        let user_type = UserType::parse(&request.user_type).ok_or_else(|| {
            AppError::ValidationError(format!("Unknown user type '{}'", request.user_type))
        })?;

        let user = self
            .provider
            .sign_up(NewUser {
                username: request.username.trim(),
                email: request.email.trim(),
                password: &request.password,
                user_type,
            })
            .await?;

        log::info!("Registered user {}", user.id);
        Ok(user)
    }

    pub async fn login(&self, request: LoginUserRequest) -> AppResult<(AuthUser, AuthSession)> {
        request.validate()?;
        self.provider
            .sign_in(request.email.trim(), &request.password)
            .await
    }

    pub async fn current_user(&self, access_token: &str) -> AppResult<AuthUser> {
        self.provider.current_user(access_token).await
    }

    pub async fn logout(&self, access_token: &str) -> AppResult<()> {
        self.provider.sign_out(access_token).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{errors::AuthError, test_utils::fakes::InMemoryIdentityProvider};

    fn register_request(user_type: &str) -> RegisterUserRequest {
        RegisterUserRequest {
            username: "ada".to_string(),
            email: "ada@example.com".to_string(),
            password: "correct horse".to_string(),
            user_type: user_type.to_string(),
        }
    }

    #[tokio::test]
    async fn register_passes_metadata_to_provider() {
        let service = AuthService::new(Arc::new(InMemoryIdentityProvider::new()));
        let user = service.register(register_request("Teacher")).await.unwrap();

        assert_eq!(user.username.as_deref(), Some("ada"));
        assert_eq!(user.user_type.as_deref(), Some("teacher"));
    }

    #[tokio::test]
    async fn register_rejects_unknown_user_type() {
        let service = AuthService::new(Arc::new(InMemoryIdentityProvider::new()));
        let err = service.register(register_request("wizard")).await.unwrap_err();
        assert!(matches!(err, AppError::ValidationError(_)));
    }

    #[tokio::test]
    async fn register_validates_email() {
        let service = AuthService::new(Arc::new(InMemoryIdentityProvider::new()));
        let mut request = register_request("student");
        request.email = "nope".to_string();
        assert!(matches!(
            service.register(request).await,
            Err(AppError::ValidationError(_))
        ));
    }

    #[tokio::test]
    async fn unconfirmed_login_surfaces_email_not_confirmed() {
        let provider = Arc::new(InMemoryIdentityProvider::new());
        let service = AuthService::new(provider.clone());
        service.register(register_request("student")).await.unwrap();

        let err = service
            .login(LoginUserRequest {
                email: "ada@example.com".to_string(),
                password: "correct horse".to_string(),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Auth(AuthError::EmailNotConfirmed)));

        provider.confirm("ada@example.com").await;
        let (user, session) = service
            .login(LoginUserRequest {
                email: "ada@example.com".to_string(),
                password: "correct horse".to_string(),
            })
            .await
            .unwrap();
        assert!(user.email_verified);
        assert_eq!(service.current_user(&session.access_token).await.unwrap(), user);
    }
}
