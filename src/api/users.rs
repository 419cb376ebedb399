//! User API endpoints and operator login.

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    Json,
};
use serde_json::Value;

use super::ApiResult;
use crate::auth::{check_password_policy, hash_password, verify_password};
use crate::errors::AppError;
use crate::models::{
    new_user_document, redact, stamp, utc_timestamp, Collection, Document, LoginRequest, ID_FIELD,
    PASSWORD_FIELD,
};
use crate::AppState;

/// GET /api/users - List all users without their password field.
pub async fn list_users(State(state): State<AppState>) -> ApiResult<Json<Vec<Document>>> {
    let users = state.repo.list(Collection::Users).await?;
    Ok(Json(users.into_iter().map(redact).collect()))
}

/// POST /api/auth/login - Log in, registering unknown usernames on first use.
///
/// Unknown username with a compliant password creates the account (201).
/// Known username with a matching password refreshes `lastActive` (200).
pub async fn login(
    State(state): State<AppState>,
    body: Result<Json<LoginRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<Document>)> {
    let Json(request) = body?;

    let (username, password) = match (request.username, request.password) {
        (Some(username), Some(password))
            if !username.trim().is_empty() && !password.is_empty() =>
        {
            (username, password)
        }
        _ => {
            return Err(AppError::Validation(
                "Username and password are required".to_string(),
            ))
        }
    };

    let existing = state
        .repo
        .find_one(Collection::Users, "username", &username)
        .await?;

    match existing {
        None => register(&state, &username, &password).await,
        Some(user) => authenticate(&state, user, password).await,
    }
}

async fn register(
    state: &AppState,
    username: &str,
    password: &str,
) -> ApiResult<(StatusCode, Json<Document>)> {
    if let Err(failures) = check_password_policy(password) {
        let failed: Vec<&str> = failures.iter().map(|f| f.as_str()).collect();
        tracing::warn!(username, ?failed, "Rejected password for new account");
        return Err(AppError::Validation(
            "Password does not meet security requirements".to_string(),
        ));
    }

    let hashed = {
        let password = password.to_string();
        tokio::task::spawn_blocking(move || hash_password(&password))
            .await
            .map_err(|e| AppError::Internal(format!("Password hashing task failed: {}", e)))??
    };

    let mut user = new_user_document(username, hashed, &utc_timestamp());
    let Some(id) = state
        .repo
        .insert_if_absent(Collection::Users, "username", username, &user)
        .await?
    else {
        // Another login registered the same username first.
        let user = state
            .repo
            .find_one(Collection::Users, "username", username)
            .await?
            .ok_or_else(invalid_credentials)?;
        return authenticate(state, user, password.to_string()).await;
    };
    tracing::info!(username, %id, "Registered new operator");

    user.insert(ID_FIELD.to_string(), Value::String(id));
    Ok((StatusCode::CREATED, Json(redact(user))))
}

async fn authenticate(
    state: &AppState,
    mut user: Document,
    password: String,
) -> ApiResult<(StatusCode, Json<Document>)> {
    let stored = user
        .get(PASSWORD_FIELD)
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();

    if stored.is_empty() {
        return Err(invalid_credentials());
    }

    let verified = tokio::task::spawn_blocking(move || verify_password(&password, &stored))
        .await
        .map_err(|e| AppError::Internal(format!("Password check task failed: {}", e)))?;

    if !verified {
        return Err(invalid_credentials());
    }

    let id = user
        .get(ID_FIELD)
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();

    let mut touched = Document::new();
    stamp(
        &mut touched,
        Collection::Users.update_stamps(),
        &utc_timestamp(),
    );
    if !state.repo.update(Collection::Users, &id, &touched).await? {
        // Deleted between lookup and stamp.
        tracing::warn!(%id, "Operator record vanished during login");
        return Err(invalid_credentials());
    }

    user.extend(touched);
    Ok((StatusCode::OK, Json(redact(user))))
}

fn invalid_credentials() -> AppError {
    AppError::Unauthorized("Invalid username or password".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{init_database, Repository};
    use crate::weather::WeatherClient;
    use serde_json::json;
    use std::sync::Arc;
    use tempfile::TempDir;
    use uuid::Uuid;

    async fn state() -> (AppState, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let pool = init_database(&temp_dir.path().join("test.sqlite"))
            .await
            .unwrap();
        let state = AppState {
            repo: Arc::new(Repository::new(pool)),
            weather: Arc::new(WeatherClient::new("http://127.0.0.1:9".to_string(), None)),
        };
        (state, temp_dir)
    }

    #[tokio::test]
    async fn test_authenticate_rejects_vanished_record() {
        let (state, _dir) = state().await;

        let user = json!({
            "id": Uuid::new_v4().to_string(),
            "username": "ghost",
            "password": hash_password("Valid123!").unwrap(),
        })
        .as_object()
        .cloned()
        .unwrap();

        let err = authenticate(&state, user, "Valid123!".to_string())
            .await
            .unwrap_err();
        assert_eq!(err.status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(state.repo.count(Collection::Users).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_authenticate_stamps_last_active() {
        let (state, _dir) = state().await;

        let stored = new_user_document(
            "operator1",
            hash_password("Valid123!").unwrap(),
            "2024-12-15T10:00:00.000000Z",
        );
        let id = state.repo.insert(Collection::Users, &stored).await.unwrap();
        let user = state.repo.get(Collection::Users, &id).await.unwrap().unwrap();

        let (status, Json(body)) = authenticate(&state, user, "Valid123!".to_string())
            .await
            .unwrap();
        assert_eq!(status, StatusCode::OK);
        assert!(body.get(PASSWORD_FIELD).is_none());
        assert_ne!(body["lastActive"], "2024-12-15T10:00:00.000000Z");
    }
}
