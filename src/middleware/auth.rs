use axum::{
    extract::Request,
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Json, Response},
};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::models::role::{authorize, Role};
use crate::models::user::User;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: i64,
    pub role: Role,
    pub email: String,
    pub exp: usize,
}

pub fn issue_token(user: &User, secret: &str, expires_hours: i64) -> crate::error::Result<String> {
    let exp = (Utc::now() + Duration::hours(expires_hours)).timestamp() as usize;
    let claims = Claims {
        sub: user.id,
        role: user.role,
        email: user.email.clone(),
        exp,
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| crate::error::Error::Internal(format!("Failed to sign token: {}", e)))
}

pub fn decode_token(token: &str, secret: &str) -> Result<Claims, jsonwebtoken::errors::Error> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.validate_exp = true;
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &validation,
    )
    .map(|data| data.claims)
}

fn bearer_claims(req: &Request) -> Result<Claims, Response> {
    let Some(auth_header) = req.headers().get(axum::http::header::AUTHORIZATION) else {
        return Err((
            StatusCode::UNAUTHORIZED,
            Json(json!({"error":"missing_authorization"})),
        )
            .into_response());
    };
    let Ok(auth_str) = auth_header.to_str() else {
        return Err((
            StatusCode::UNAUTHORIZED,
            Json(json!({"error":"bad_authorization"})),
        )
            .into_response());
    };
    let Some(token) = auth_str.strip_prefix("Bearer ") else {
        return Err((
            StatusCode::UNAUTHORIZED,
            Json(json!({"error":"unsupported_scheme"})),
        )
            .into_response());
    };

    let config = crate::config::get_config();
    decode_token(token, &config.jwt_secret).map_err(|_| {
        (
            StatusCode::UNAUTHORIZED,
            Json(json!({"error":"invalid_token"})),
        )
            .into_response()
    })
}

async fn require_role(mut req: Request, next: Next, required: Role) -> Response {
    let claims = match bearer_claims(&req) {
        Ok(claims) => claims,
        Err(resp) => return resp,
    };
    if !authorize(claims.role, required) {
        return (StatusCode::FORBIDDEN, Json(json!({"error":"forbidden"}))).into_response();
    }
    req.extensions_mut().insert(claims);
    next.run(req).await
}

pub async fn require_auth(req: Request, next: Next) -> Response {
    require_role(req, next, Role::Student).await
}

pub async fn require_teacher(req: Request, next: Next) -> Response {
    require_role(req, next, Role::Teacher).await
}

pub async fn require_admin(req: Request, next: Next) -> Response {
    require_role(req, next, Role::Admin).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn sample_user() -> User {
        User {
            id: 42,
            first_name: "Ada".into(),
            last_name: "Lovelace".into(),
            patronymic: None,
            email: "ada@example.com".into(),
            phone: "+100000000".into(),
            school: "School 1".into(),
            role: Role::Teacher,
            login: Some("adalove1".into()),
            password_hash: None,
            is_approved: true,
            created_at: Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap(),
        }
    }

    #[test]
    fn token_round_trips_claims() {
        let token = issue_token(&sample_user(), "unit-secret", 1).unwrap();
        let claims = decode_token(&token, "unit-secret").unwrap();
        assert_eq!(claims.sub, 42);
        assert_eq!(claims.role, Role::Teacher);
        assert_eq!(claims.email, "ada@example.com");
    }

    #[test]
    fn wrong_secret_is_rejected() {
        let token = issue_token(&sample_user(), "unit-secret", 1).unwrap();
        assert!(decode_token(&token, "other-secret").is_err());
    }
}
