use axum::{
    extract::{FromRef, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use tracing::{error, info, instrument, warn};

use crate::{
    auth::{
        dto::{AuthResponse, LoginRequest, PublicUser, RegisterRequest},
        repo::User,
        services::{hash_password, is_valid_email, verify_password, CurrentUser, JwtKeys},
    },
    error::{ApiError, Violation},
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/profile", get(profile))
}

#[instrument(skip(state, payload))]
pub async fn register(
    State(state): State<AppState>,
    Json(mut payload): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<AuthResponse>), ApiError> {
    payload.email = payload.email.trim().to_lowercase();
    payload.name = payload.name.trim().to_string();

    let mut violations = Vec::new();
    if payload.name.is_empty() {
        violations.push(Violation::new("name", "Name is required"));
    }
    if !is_valid_email(&payload.email) {
        violations.push(Violation::new("email", "Invalid email"));
    }
    if payload.password.len() < 8 {
        violations.push(Violation::new(
            "password",
            "Password must be at least 8 characters",
        ));
    }
    if !violations.is_empty() {
        warn!(email = %payload.email, "registration rejected");
        return Err(ApiError::Validation(violations));
    }

    if let Some(_existing) = User::find_by_email(&state.db, &payload.email)
        .await
        .map_err(ApiError::Persistence)?
    {
        warn!(email = %payload.email, "email already registered");
        return Err(ApiError::Conflict("Email already registered".into()));
    }

    let hash = hash_password(&payload.password).map_err(ApiError::Internal)?;

    let user = User::create(&state.db, &payload.name, &payload.email, &hash)
        .await
        .map_err(ApiError::Persistence)?;

    let keys = JwtKeys::from_ref(&state);
    let token = keys.sign(user.id, payload.remember).map_err(|e| {
        error!(error = %e, "jwt sign failed");
        ApiError::Internal(e)
    })?;

    info!(user_id = %user.id, email = %user.email, "user registered");
    Ok((
        StatusCode::CREATED,
        Json(AuthResponse {
            message: "User registered successfully".into(),
            token,
            user: PublicUser {
                id: user.id,
                name: user.name,
                email: user.email,
            },
        }),
    ))
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    Json(mut payload): Json<LoginRequest>,
) -> Result<Json<AuthResponse>, ApiError> {
    payload.email = payload.email.trim().to_lowercase();

    // Unknown email and wrong password are indistinguishable to the caller.
    let user = User::find_by_email(&state.db, &payload.email)
        .await
        .map_err(ApiError::Persistence)?
        .ok_or_else(|| {
            warn!(email = %payload.email, "login unknown email");
            ApiError::Unauthenticated("Invalid credentials".into())
        })?;

    let ok = verify_password(&payload.password, &user.password_hash).map_err(ApiError::Internal)?;
    if !ok {
        warn!(email = %payload.email, user_id = %user.id, "login invalid password");
        return Err(ApiError::Unauthenticated("Invalid credentials".into()));
    }

    let keys = JwtKeys::from_ref(&state);
    let token = keys.sign(user.id, payload.remember).map_err(|e| {
        error!(error = %e, "jwt sign failed");
        ApiError::Internal(e)
    })?;

    info!(user_id = %user.id, email = %user.email, remember = payload.remember, "user logged in");
    Ok(Json(AuthResponse {
        message: "Login successful".into(),
        token,
        user: PublicUser {
            id: user.id,
            name: user.name,
            email: user.email,
        },
    }))
}

#[instrument(skip_all)]
pub async fn profile(CurrentUser(user): CurrentUser) -> Json<PublicUser> {
    Json(PublicUser {
        id: user.id,
        name: user.name,
        email: user.email,
    })
}

#[cfg(test)]
mod dto_tests {
    use super::*;

    #[test]
    fn auth_response_serialization_hides_nothing_public() {
        let response = AuthResponse {
            message: "User registered successfully".into(),
            token: "signed.jwt.token".into(),
            user: PublicUser {
                id: uuid::Uuid::new_v4(),
                name: "Jane Doe".into(),
                email: "jane@example.com".into(),
            },
        };

        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["token"], "signed.jwt.token");
        assert_eq!(json["user"]["email"], "jane@example.com");
        assert!(json["user"].get("password_hash").is_none());
    }

    #[test]
    fn register_request_remember_defaults_to_false() {
        let payload: RegisterRequest = serde_json::from_str(
            r#"{"name":"Jane","email":"jane@example.com","password":"long-enough"}"#,
        )
        .unwrap();
        assert!(!payload.remember);
    }

    #[test]
    fn login_request_accepts_remember_flag() {
        let payload: LoginRequest =
            serde_json::from_str(r#"{"email":"jane@example.com","password":"pw","remember":true}"#)
                .unwrap();
        assert!(payload.remember);
    }
}
