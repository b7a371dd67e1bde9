//! `UserService`: administrative user management.

use axum::Router;
use axum::extract::State;
use axum::routing::post;
use jiff::Timestamp;
use serde::{Deserialize, Serialize};
use tollgate_postgres::model::User;
use validator::Validate;

use crate::extract::{AuthIdentity, ValidateJson};
use crate::handler::{Reply, Result};
use crate::service::{ServiceState, UserDirectory};

/// A user as returned to callers, without the credential hash.
#[must_use]
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserView {
    pub id: i32,
    pub name: String,
    pub email: String,
    pub role_id: i32,
    pub last_access: Option<Timestamp>,
}

impl From<User> for UserView {
    fn from(user: User) -> Self {
        Self {
            last_access: user.last_access_at(),
            id: user.id,
            name: user.name,
            email: user.email,
            role_id: user.role_id,
        }
    }
}

#[must_use]
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListUsersResponse {
    pub users: Vec<UserView>,
}

async fn list_users(
    State(user_directory): State<UserDirectory>,
) -> Result<Reply<ListUsersResponse>> {
    let users = user_directory.list_users().await?;
    let response = ListUsersResponse {
        users: users.into_iter().map(UserView::from).collect(),
    };

    Ok(Reply::with_data("Get all users success", response))
}

#[must_use]
#[derive(Debug, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
struct CreateUserRequest {
    #[validate(length(min = 1, max = 100))]
    pub name: String,
    #[validate(email, length(max = 254))]
    pub email: String,
    #[validate(length(min = 6, max = 128))]
    pub password: String,
    #[validate(range(min = 1))]
    pub role_id: i32,
}

async fn create_user(
    State(user_directory): State<UserDirectory>,
    ValidateJson(request): ValidateJson<CreateUserRequest>,
) -> Result<Reply<UserView>> {
    let user = user_directory
        .create_user(
            &request.name,
            &request.email,
            &request.password,
            request.role_id,
        )
        .await?;

    Ok(Reply::with_data("Create user success", UserView::from(user)))
}

#[must_use]
#[derive(Debug, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
struct UpdateUserRequest {
    #[validate(length(min = 1, max = 100))]
    pub name: String,
}

/// Renames the calling user.
async fn update_user(
    State(user_directory): State<UserDirectory>,
    AuthIdentity(identity): AuthIdentity,
    ValidateJson(request): ValidateJson<UpdateUserRequest>,
) -> Result<Reply<UserView>> {
    let user = user_directory
        .rename_user(identity.user_id, &request.name)
        .await?;

    Ok(Reply::with_data("Update user success", UserView::from(user)))
}

#[must_use]
#[derive(Debug, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
struct DeleteUserRequest {
    #[validate(range(min = 1))]
    pub user_id: i32,
}

async fn delete_user(
    State(user_directory): State<UserDirectory>,
    ValidateJson(request): ValidateJson<DeleteUserRequest>,
) -> Result<Reply> {
    user_directory.delete_user(request.user_id).await?;
    Ok(Reply::ok("Delete user success"))
}

/// Returns a [`Router`] with all `UserService` methods.
pub fn routes() -> Router<ServiceState> {
    Router::new()
        .route("/proto.UserService/ListUsers", post(list_users))
        .route("/proto.UserService/CreateUser", post(create_user))
        .route("/proto.UserService/UpdateUser", post(update_user))
        .route("/proto.UserService/DeleteUser", post(delete_user))
}
