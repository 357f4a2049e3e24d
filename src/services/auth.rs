use std::sync::Arc;

use jsonwebtoken::{decode, DecodingKey, Validation};
use serde::{Deserialize, Serialize};

use crate::{config::Config, error::AppResult};

/// Caller identity carried through the request. Token issuance lives
/// outside this service; we only validate and unpack.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String, // user_id
    pub exp: i64,    // expiry
    pub iat: i64,    // issued at
}

pub struct AuthService {
    config: Arc<Config>,
}

impl AuthService {
    pub fn new(config: Arc<Config>) -> Self {
        Self { config }
    }

    pub fn validate_token(&self, token: &str) -> AppResult<Claims> {
        let key = DecodingKey::from_secret(self.config.jwt.secret.as_bytes());
        let validation = Validation::default();

        let token_data = decode::<Claims>(token, &key, &validation)?;
        Ok(token_data.claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{
        AvailabilityConfig, DatabaseConfig, JwtConfig, RedisConfig, ServerConfig,
    };
    use crate::error::AppError;
    use chrono::Utc;
    use jsonwebtoken::{encode, EncodingKey, Header};
    use std::time::Duration;

    fn test_config(secret: &str) -> Arc<Config> {
        Arc::new(Config {
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 0,
                environment: "test".to_string(),
            },
            database: DatabaseConfig {
                host: "localhost".to_string(),
                port: 5432,
                user: "postgres".to_string(),
                password: "postgres".to_string(),
                database: "spotmatch".to_string(),
                ssl_mode: "disable".to_string(),
                max_connections: 1,
            },
            redis: RedisConfig {
                host: "localhost".to_string(),
                port: 6379,
                password: None,
                db: 0,
            },
            jwt: JwtConfig {
                secret: secret.to_string(),
            },
            availability: AvailabilityConfig {
                ttl: Duration::from_secs(1800),
                sweep_interval: Duration::from_secs(60),
            },
        })
    }

    fn make_token(secret: &str, sub: &str, exp_offset_secs: i64) -> String {
        let now = Utc::now().timestamp();
        let claims = Claims {
            sub: sub.to_string(),
            exp: now + exp_offset_secs,
            iat: now,
        };
        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .unwrap()
    }

    #[test]
    fn validates_a_fresh_token() {
        let service = AuthService::new(test_config("secret-a"));
        let token = make_token("secret-a", "c0ffee00-0000-0000-0000-000000000001", 900);

        let claims = service.validate_token(&token).unwrap();
        assert_eq!(claims.sub, "c0ffee00-0000-0000-0000-000000000001");
    }

    #[test]
    fn rejects_expired_token() {
        let service = AuthService::new(test_config("secret-a"));
        let token = make_token("secret-a", "user", -3600);

        assert!(matches!(
            service.validate_token(&token),
            Err(AppError::Jwt(_))
        ));
    }

    #[test]
    fn rejects_token_signed_with_wrong_secret() {
        let service = AuthService::new(test_config("secret-a"));
        let token = make_token("secret-b", "user", 900);

        assert!(matches!(
            service.validate_token(&token),
            Err(AppError::Jwt(_))
        ));
    }
}
