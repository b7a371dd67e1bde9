//! `AuthService`: login, registration and logout.

use axum::Router;
use axum::extract::State;
use axum::routing::post;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::extract::{AuthIdentity, ValidateJson};
use crate::handler::users::UserView;
use crate::handler::{Reply, Result};
use crate::service::{ServiceState, SessionManager, UserDirectory};

/// Request payload for login.
///
/// Only lengths are checked here: a malformed email is an unknown account and
/// must fail the same way as a wrong password.
#[must_use]
#[derive(Debug, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
struct LoginRequest {
    #[validate(length(min = 1, max = 254))]
    pub email: String,
    #[validate(length(min = 1, max = 128))]
    pub password: String,
}

#[must_use]
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LoginResponse {
    /// Opaque session token for `authorization: Bearer`.
    pub access_token: String,
}

async fn login(
    State(session_manager): State<SessionManager>,
    ValidateJson(request): ValidateJson<LoginRequest>,
) -> Result<Reply<LoginResponse>> {
    let token = session_manager
        .login(&request.email, &request.password)
        .await?;

    let response = LoginResponse {
        access_token: token.into_inner(),
    };

    Ok(Reply::with_data("Login success", response))
}

/// Request payload for self-registration.
#[must_use]
#[derive(Debug, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
struct RegisterRequest {
    #[validate(length(min = 1, max = 100))]
    pub name: String,
    #[validate(email, length(max = 254))]
    pub email: String,
    #[validate(length(min = 6, max = 128))]
    pub password: String,
}

async fn register(
    State(user_directory): State<UserDirectory>,
    ValidateJson(request): ValidateJson<RegisterRequest>,
) -> Result<Reply<UserView>> {
    let user = user_directory
        .register(&request.name, &request.email, &request.password)
        .await?;

    Ok(Reply::with_data("Register success", UserView::from(user)))
}

async fn logout(
    State(session_manager): State<SessionManager>,
    AuthIdentity(identity): AuthIdentity,
) -> Result<Reply> {
    session_manager.logout(&identity.token).await?;
    Ok(Reply::ok("Logout success"))
}

/// Returns a [`Router`] with all `AuthService` methods.
pub fn routes() -> Router<ServiceState> {
    Router::new()
        .route("/proto.AuthService/Login", post(login))
        .route("/proto.AuthService/Register", post(register))
        .route("/proto.AuthService/Logout", post(logout))
}

#[cfg(test)]
mod test {
    use axum::http::StatusCode;
    use serde_json::{Value, json};

    use crate::handler::test::TestFixture;

    #[tokio::test]
    async fn login_returns_an_access_token() -> anyhow::Result<()> {
        let fixture = TestFixture::new()?;
        fixture.add_user("Alice", "a@x.com", "pw1", 2)?;

        let response = fixture
            .server
            .post("/proto.AuthService/Login")
            .json(&json!({ "email": "a@x.com", "password": "pw1" }))
            .await;
        response.assert_status_ok();

        let body: Value = response.json();
        assert_eq!(body["status"], true);
        assert_eq!(body["message"], "Login success");
        assert_eq!(body["data"]["accessToken"].as_str().map(str::len), Some(32));
        assert_eq!(fixture.sessions.len(), 1);
        Ok(())
    }

    #[tokio::test]
    async fn wrong_password_is_invalid_credentials() -> anyhow::Result<()> {
        let fixture = TestFixture::new()?;
        fixture.add_user("Alice", "a@x.com", "pw1", 2)?;

        for (email, password) in [("a@x.com", "nope"), ("not-an-email", "pw1")] {
            let response = fixture
                .server
                .post("/proto.AuthService/Login")
                .json(&json!({ "email": email, "password": password }))
                .await;
            response.assert_status(StatusCode::BAD_REQUEST);

            let body: Value = response.json();
            assert_eq!(body["name"], "invalid_credentials");
            assert_eq!(
                body["message"],
                "Make sure you have provided a valid email or password"
            );
        }
        Ok(())
    }

    #[tokio::test]
    async fn empty_login_fields_are_bad_request() -> anyhow::Result<()> {
        let fixture = TestFixture::new()?;

        let response = fixture
            .server
            .post("/proto.AuthService/Login")
            .json(&json!({ "email": "", "password": "" }))
            .await;
        response.assert_status(StatusCode::BAD_REQUEST);

        let body: Value = response.json();
        assert_eq!(body["name"], "bad_request");
        Ok(())
    }

    #[tokio::test]
    async fn register_then_duplicate_is_already_exists() -> anyhow::Result<()> {
        let fixture = TestFixture::new()?;
        let request = json!({ "name": "Bob", "email": "bob@x.com", "password": "secret-pw" });

        let response = fixture
            .server
            .post("/proto.AuthService/Register")
            .json(&request)
            .await;
        response.assert_status_ok();

        let body: Value = response.json();
        assert_eq!(body["data"]["roleId"], 3);
        assert!(body["data"].get("password").is_none());

        let response = fixture
            .server
            .post("/proto.AuthService/Register")
            .json(&request)
            .await;
        response.assert_status(StatusCode::CONFLICT);

        let body: Value = response.json();
        assert_eq!(body["name"], "already_exists");
        Ok(())
    }

    #[tokio::test]
    async fn logout_ends_the_session_without_a_permission_rule() -> anyhow::Result<()> {
        let fixture = TestFixture::new()?;
        fixture.add_user("Alice", "a@x.com", "pw1", 3)?;
        let token = fixture.login("a@x.com", "pw1").await?;

        let response = fixture
            .call("/proto.AuthService/Logout", Some(&token), Some("be"), json!({}))
            .await;
        response.assert_status_ok();
        assert_eq!(fixture.sessions.len(), 0);

        let response = fixture
            .call("/proto.AuthService/Logout", Some(&token), Some("be"), json!({}))
            .await;
        response.assert_status(StatusCode::UNAUTHORIZED);
        Ok(())
    }
}
