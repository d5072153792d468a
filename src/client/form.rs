use tracing::warn;

use crate::accounts::PublicUser;
use crate::client::api::{AccountApi, ApiReply, ClientError};

pub const SERVER_ERROR_FALLBACK: &str = "Server error. Please try again.";

pub const TEST_USERNAME: &str = "student1";
pub const TEST_PASSWORD: &str = "123456";
pub const TEST_EMAIL: &str = "student1@school.com";

/// Picks the banner text for a failed call: the server's message if there is
/// one, `fallback` for a 2xx reply without success, the generic server error
/// otherwise.
fn failure_text(outcome: Result<ApiReply, ClientError>, fallback: &str) -> String {
    match outcome {
        Ok(reply) if reply.is_http_success() => {
            reply.message.unwrap_or_else(|| fallback.to_string())
        }
        Ok(reply) => reply
            .message
            .unwrap_or_else(|| SERVER_ERROR_FALLBACK.to_string()),
        Err(e) => {
            warn!(error = %e, "account api call failed");
            SERVER_ERROR_FALLBACK.to_string()
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoginField {
    Username,
    Password,
}

/// State behind the login form.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
    pub loading: bool,
    pub error: Option<String>,
    pub message: Option<String>,
}

impl LoginForm {
    /// Editing any field clears the error banner.
    pub fn set_field(&mut self, field: LoginField, value: impl Into<String>) {
        match field {
            LoginField::Username => self.username = value.into(),
            LoginField::Password => self.password = value.into(),
        }
        self.error = None;
    }

    pub fn dismiss_error(&mut self) {
        self.error = None;
    }

    pub fn dismiss_message(&mut self) {
        self.message = None;
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }

    /// Submit the credentials. Returns the user on success.
    pub async fn submit<A>(&mut self, api: &A) -> Option<PublicUser>
    where
        A: AccountApi + ?Sized,
    {
        self.loading = true;
        self.error = None;
        self.message = None;

        let outcome = api.login(&self.username, &self.password).await;
        self.loading = false;

        match outcome {
            Ok(ApiReply {
                success: true,
                user: Some(user),
                status,
                ..
            }) if (200..300).contains(&status) => {
                self.message = Some("Login successful!".into());
                Some(user)
            }
            other => {
                self.error = Some(failure_text(other, "Login failed"));
                None
            }
        }
    }

    /// Register the well-known demo student account.
    pub async fn create_test_user<A>(&mut self, api: &A)
    where
        A: AccountApi + ?Sized,
    {
        match api.register(TEST_USERNAME, TEST_PASSWORD, TEST_EMAIL).await {
            Ok(reply) if reply.is_http_success() => {
                if reply.success {
                    self.message = Some(format!(
                        "Test user created! Username: {TEST_USERNAME}, Password: {TEST_PASSWORD}"
                    ));
                }
            }
            Ok(_) | Err(_) => self.error = Some("Failed to create test user".into()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegisterField {
    Username,
    Password,
    Email,
}

/// State behind the registration form.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RegisterForm {
    pub username: String,
    pub password: String,
    pub email: String,
    pub loading: bool,
    pub error: Option<String>,
    pub message: Option<String>,
}

impl RegisterForm {
    pub fn set_field(&mut self, field: RegisterField, value: impl Into<String>) {
        match field {
            RegisterField::Username => self.username = value.into(),
            RegisterField::Password => self.password = value.into(),
            RegisterField::Email => self.email = value.into(),
        }
        self.error = None;
    }

    /// Submit the form. On success the fields are cleared and the new id is
    /// returned.
    pub async fn submit<A>(&mut self, api: &A) -> Option<i64>
    where
        A: AccountApi + ?Sized,
    {
        self.loading = true;
        self.error = None;
        self.message = None;

        let outcome = api
            .register(&self.username, &self.password, &self.email)
            .await;
        self.loading = false;

        match outcome {
            Ok(reply) if reply.success && reply.is_http_success() => {
                self.username.clear();
                self.password.clear();
                self.email.clear();
                self.message = Some(
                    reply
                        .message
                        .unwrap_or_else(|| "User registered successfully".into()),
                );
                reply.user_id
            }
            other => {
                self.error = Some(failure_text(other, "Registration failed"));
                None
            }
        }
    }
}

/// Who is logged in, if anyone.
#[derive(Debug, Clone, Default)]
pub struct Session {
    user: Option<PublicUser>,
}

impl Session {
    pub fn sign_in(&mut self, user: PublicUser) {
        self.user = Some(user);
    }

    pub fn user(&self) -> Option<&PublicUser> {
        self.user.as_ref()
    }

    pub fn is_logged_in(&self) -> bool {
        self.user.is_some()
    }

    /// Drops the user and resets the login form.
    pub fn logout(&mut self, form: &mut LoginForm) {
        self.user = None;
        form.clear();
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::sync::Mutex;

    use async_trait::async_trait;

    use super::*;

    /// Replays queued replies and records the arguments it was called with.
    #[derive(Default)]
    struct ScriptedApi {
        replies: Mutex<VecDeque<Result<ApiReply, ClientError>>>,
        calls: Mutex<Vec<Vec<String>>>,
    }

    impl ScriptedApi {
        fn with(reply: Result<ApiReply, ClientError>) -> Self {
            let api = Self::default();
            api.replies.lock().unwrap().push_back(reply);
            api
        }

        fn next(&self, args: &[&str]) -> Result<ApiReply, ClientError> {
            self.calls
                .lock()
                .unwrap()
                .push(args.iter().map(|s| s.to_string()).collect());
            self.replies
                .lock()
                .unwrap()
                .pop_front()
                .expect("unexpected api call")
        }
    }

    #[async_trait]
    impl AccountApi for ScriptedApi {
        async fn login(&self, username: &str, password: &str) -> Result<ApiReply, ClientError> {
            self.next(&[username, password])
        }

        async fn register(
            &self,
            username: &str,
            password: &str,
            email: &str,
        ) -> Result<ApiReply, ClientError> {
            self.next(&[username, password, email])
        }
    }

    fn reply(status: u16, success: bool, message: Option<&str>) -> ApiReply {
        ApiReply {
            status,
            success,
            message: message.map(str::to_string),
            ..ApiReply::default()
        }
    }

    fn admin() -> PublicUser {
        PublicUser {
            id: 1,
            username: "admin".into(),
            email: Some("admin@school.com".into()),
        }
    }

    fn transport_error() -> ClientError {
        ClientError::UnexpectedBody {
            status: 502,
            source: serde_json::from_str::<ApiReply>("<html>").unwrap_err(),
        }
    }

    #[tokio::test]
    async fn successful_login_sets_message_and_returns_user() {
        let api = ScriptedApi::with(Ok(ApiReply {
            user: Some(admin()),
            ..reply(200, true, Some("Login successful"))
        }));
        let mut form = LoginForm::default();
        form.set_field(LoginField::Username, "admin");
        form.set_field(LoginField::Password, "admin123");

        let user = form.submit(&api).await;

        assert_eq!(user, Some(admin()));
        assert_eq!(form.message.as_deref(), Some("Login successful!"));
        assert!(form.error.is_none());
        assert!(!form.loading);
        assert_eq!(api.calls.lock().unwrap()[0], vec!["admin", "admin123"]);
    }

    #[tokio::test]
    async fn rejected_login_shows_server_message() {
        let api = ScriptedApi::with(Ok(reply(401, false, Some("Invalid username or password"))));
        let mut form = LoginForm {
            message: Some("stale".into()),
            ..LoginForm::default()
        };

        assert!(form.submit(&api).await.is_none());
        assert_eq!(form.error.as_deref(), Some("Invalid username or password"));
        assert!(form.message.is_none());
        assert!(!form.loading);
    }

    #[tokio::test]
    async fn unreachable_server_uses_fallback() {
        let api = ScriptedApi::with(Err(transport_error()));
        let mut form = LoginForm::default();
        form.submit(&api).await;
        assert_eq!(form.error.as_deref(), Some(SERVER_ERROR_FALLBACK));
    }

    #[tokio::test]
    async fn ok_status_without_success_says_login_failed() {
        let api = ScriptedApi::with(Ok(reply(200, false, None)));
        let mut form = LoginForm::default();
        form.submit(&api).await;
        assert_eq!(form.error.as_deref(), Some("Login failed"));
    }

    #[test]
    fn editing_a_field_clears_the_error() {
        let mut form = LoginForm {
            error: Some("Invalid username or password".into()),
            ..LoginForm::default()
        };
        form.set_field(LoginField::Password, "x");
        assert!(form.error.is_none());
        assert_eq!(form.password, "x");
    }

    #[tokio::test]
    async fn test_user_shortcut() {
        let api = ScriptedApi::with(Ok(reply(200, true, Some("User registered successfully"))));
        let mut form = LoginForm::default();
        form.create_test_user(&api).await;
        assert_eq!(
            form.message.as_deref(),
            Some("Test user created! Username: student1, Password: 123456")
        );
        assert_eq!(
            api.calls.lock().unwrap()[0],
            vec!["student1", "123456", "student1@school.com"]
        );

        let api = ScriptedApi::with(Ok(reply(400, false, Some("Username already exists"))));
        let mut form = LoginForm::default();
        form.create_test_user(&api).await;
        assert_eq!(form.error.as_deref(), Some("Failed to create test user"));
    }

    #[tokio::test]
    async fn registration_clears_fields_on_success() {
        let api = ScriptedApi::with(Ok(ApiReply {
            user_id: Some(3),
            ..reply(200, true, Some("User registered successfully"))
        }));
        let mut form = RegisterForm::default();
        form.set_field(RegisterField::Username, "student2");
        form.set_field(RegisterField::Password, "pw");
        form.set_field(RegisterField::Email, "s2@school.com");

        assert_eq!(form.submit(&api).await, Some(3));
        assert!(form.username.is_empty() && form.password.is_empty() && form.email.is_empty());
        assert_eq!(form.message.as_deref(), Some("User registered successfully"));
    }

    #[tokio::test]
    async fn registration_keeps_fields_on_failure() {
        let api = ScriptedApi::with(Ok(reply(400, false, Some("Username already exists"))));
        let mut form = RegisterForm {
            username: "student1".into(),
            password: "pw".into(),
            email: "s@school.com".into(),
            ..RegisterForm::default()
        };

        assert_eq!(form.submit(&api).await, None);
        assert_eq!(form.username, "student1");
        assert_eq!(form.error.as_deref(), Some("Username already exists"));
    }

    #[test]
    fn logout_resets_session_and_form() {
        let mut session = Session::default();
        let mut form = LoginForm {
            username: "admin".into(),
            password: "admin123".into(),
            message: Some("Login successful!".into()),
            ..LoginForm::default()
        };
        session.sign_in(admin());
        assert!(session.is_logged_in());

        session.logout(&mut form);
        assert!(session.user().is_none());
        assert_eq!(form, LoginForm::default());
    }
}
