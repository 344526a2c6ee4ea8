use actix_web::{
    body::EitherBody,
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    web, Error, HttpMessage, ResponseError,
};
use chrono::{Duration, Utc};
use futures::future::LocalBoxFuture;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use mongodb::bson::oid::ObjectId;
use serde::{Deserialize, Serialize};
use std::future::{ready, Ready};

use crate::config::Config;
use crate::state::AppState;
use crate::utils::{AppError, AppResult};

/// Session credential payload
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    pub sub: String, // user id (hex)
    pub iat: usize,
    pub exp: usize,
    pub jti: String,
}

impl Claims {
    pub fn user_id(&self) -> AppResult<ObjectId> {
        ObjectId::parse_str(&self.sub).map_err(|_| AppError::Unauthorized("Invalid token".into()))
    }
}

pub fn generate_jwt(user_id: &ObjectId, config: &Config) -> AppResult<String> {
    let now = Utc::now();
    let claims = Claims {
        sub: user_id.to_hex(),
        iat: now.timestamp() as usize,
        exp: (now + Duration::days(config.jwt_expiry_days)).timestamp() as usize,
        jti: uuid::Uuid::new_v4().to_string(),
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(config.jwt_secret.as_ref()),
    )
    .map_err(|e| AppError::Internal(format!("Failed to generate token: {}", e)))
}

pub fn verify_jwt(token: &str, config: &Config) -> AppResult<Claims> {
    let validation = Validation::new(Algorithm::HS256);
    let data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(config.jwt_secret.as_ref()),
        &validation,
    )?;
    Ok(data.claims)
}

fn bearer_token(req: &ServiceRequest) -> Option<&str> {
    req.headers()
        .get("Authorization")?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

/// Rejects requests without a valid bearer JWT (401 JSON body) and attaches
/// its `Claims` to the request, where handlers read them via `web::ReqData<Claims>`.
pub struct AuthMiddleware;

impl<S, B> Transform<S, ServiceRequest> for AuthMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type InitError = ();
    type Transform = AuthMiddlewareService<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(AuthMiddlewareService { service }))
    }
}

pub struct AuthMiddlewareService<S> {
    service: S,
}

impl<S, B> Service<ServiceRequest> for AuthMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let claims = match req.app_data::<web::Data<AppState>>() {
            Some(state) => match bearer_token(&req) {
                Some(token) => verify_jwt(token, &state.config).map_err(|e| {
                    log::warn!("🔒 Rejected token on {}: {}", req.path(), e);
                    AppError::Unauthorized("Invalid token".into())
                }),
                None => Err(AppError::Unauthorized("Not authenticated".into())),
            },
            None => Err(AppError::Internal("Application state not configured".into())),
        };

        match claims {
            Ok(claims) => {
                req.extensions_mut().insert(claims);
                let fut = self.service.call(req);
                Box::pin(async move { fut.await.map(ServiceResponse::map_into_left_body) })
            }
            Err(e) => {
                let response = req.into_response(e.error_response()).map_into_right_body();
                Box::pin(async move { Ok(response) })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_jwt_round_trip() {
        let config = Config::for_tests();
        let user_id = ObjectId::new();
        let token = generate_jwt(&user_id, &config).unwrap();
        let claims = verify_jwt(&token, &config).unwrap();
        assert_eq!(claims.user_id().unwrap(), user_id);
    }

    #[test]
    fn test_jwt_rejects_other_secret() {
        let config = Config::for_tests();
        let token = generate_jwt(&ObjectId::new(), &config).unwrap();

        let mut other = Config::for_tests();
        other.jwt_secret = "another-secret".into();
        assert!(matches!(verify_jwt(&token, &other), Err(AppError::Unauthorized(_))));
    }

    #[test]
    fn test_jwt_rejects_expired() {
        let mut config = Config::for_tests();
        config.jwt_expiry_days = -2;
        let token = generate_jwt(&ObjectId::new(), &config).unwrap();
        assert!(verify_jwt(&token, &config).is_err());
    }
}
