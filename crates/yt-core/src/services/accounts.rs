//! Signup, login and session tokens.

use chrono::Utc;
use uuid::Uuid;

use crate::error::{AppError, Result};
use crate::forms::{FieldErrors, SignupForm};
use crate::models::{Identity, User};

use super::Yatube;

const BAD_CREDENTIALS: &str =
    "Please enter a correct username and password. Note that both fields may be case-sensitive.";

impl Yatube {
    pub async fn signup(&self, form: SignupForm) -> Result<Identity> {
        form.validate()?;
        let username = form.username.trim();
        if self.users.get_user_by_username(username).await?.is_some() {
            let mut errors = FieldErrors::new();
            errors.add("username", "A user with that username already exists.");
            return Err(AppError::Validation(errors));
        }
        let user = User {
            id: Uuid::now_v7(),
            username: username.to_string(),
            password_hash: self.auth.hash_password(&form.password1)?,
            created_at: Utc::now(),
        };
        self.users.create_user(user.clone()).await?;
        log::info!("user {} signed up", user.username);
        Ok(user.identity())
    }

    pub async fn login(&self, username: &str, password: &str) -> Result<Identity> {
        let user = self
            .users
            .get_user_by_username(username.trim())
            .await?
            .ok_or_else(|| AppError::Unauthorized(BAD_CREDENTIALS.into()))?;
        if !self.auth.verify_password(password, &user.password_hash).await {
            log::info!("failed login for {}", user.username);
            return Err(AppError::Unauthorized(BAD_CREDENTIALS.into()));
        }
        Ok(user.identity())
    }

    pub fn session_token(&self, identity: &Identity) -> Result<String> {
        Ok(self.auth.issue_session(identity)?)
    }

    /// `None` for forged, malformed, expired or missing tokens.
    pub fn identity_from_session(&self, token: &str) -> Option<Identity> {
        self.auth.verify_session(token)
    }
}

#[cfg(test)]
mod tests {
    use super::super::testing::*;
    use super::*;

    fn form(username: &str) -> SignupForm {
        SignupForm {
            username: username.into(),
            password1: "sevastopol".into(),
            password2: "sevastopol".into(),
        }
    }

    #[tokio::test]
    async fn test_signup_hashes_password() {
        let mut mocks = Mocks::new();
        mocks.users.expect_get_user_by_username().returning(|_| Ok(None));
        mocks
            .auth
            .expect_hash_password()
            .returning(|p| Ok(format!("hashed:{p}")));
        mocks
            .users
            .expect_create_user()
            .withf(|u| u.username == "leo" && u.password_hash == "hashed:sevastopol")
            .times(1)
            .returning(|_| Ok(()));

        let identity = mocks.build().signup(form(" leo ")).await.unwrap();
        assert_eq!(identity.username, "leo");
    }

    #[tokio::test]
    async fn test_signup_duplicate_username() {
        let mut mocks = Mocks::new();
        mocks
            .users
            .expect_get_user_by_username()
            .returning(|_| Ok(Some(user("leo"))));
        mocks.users.expect_create_user().never();

        let err = mocks.build().signup(form("leo")).await.unwrap_err();
        let AppError::Validation(errors) = err else { panic!("expected validation error") };
        assert!(errors.get("username").is_some());
    }

    #[tokio::test]
    async fn test_login_wrong_password() {
        let mut mocks = Mocks::new();
        mocks
            .users
            .expect_get_user_by_username()
            .returning(|_| Ok(Some(user("leo"))));
        mocks.auth.expect_verify_password().returning(|_, _| false);

        let err = mocks.build().login("leo", "nope").await.unwrap_err();
        assert!(matches!(err, AppError::Unauthorized(_)));
    }

    #[tokio::test]
    async fn test_login_unknown_user() {
        let mut mocks = Mocks::new();
        mocks.users.expect_get_user_by_username().returning(|_| Ok(None));
        mocks.auth.expect_verify_password().never();

        let err = mocks.build().login("ghost", "whatever").await.unwrap_err();
        assert!(matches!(err, AppError::Unauthorized(_)));
    }
}
