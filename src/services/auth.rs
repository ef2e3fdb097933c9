// src/services/auth.rs

use jsonwebtoken::{decode, DecodingKey, Validation};

use crate::{
    common::error::AppError,
    models::auth::{CallerIdentity, Claims},
};

/// Validação dos tokens emitidos pelo serviço de login (aqui só lemos, nunca emitimos).
#[derive(Clone)]
pub struct AuthService {
    jwt_secret: String,
}

impl AuthService {
    pub fn new(jwt_secret: String) -> Self {
        Self { jwt_secret }
    }

    pub fn validate_token(&self, token: &str) -> Result<CallerIdentity, AppError> {
        let validation = Validation::default();
        let token_data = decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.jwt_secret.as_ref()),
            &validation,
        )
        .map_err(|e| {
            tracing::debug!("Token recusado: {}", e);
            AppError::InvalidToken
        })?;

        Ok(CallerIdentity::from(token_data.claims))
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::models::auth::Role;
    use chrono::Utc;
    use jsonwebtoken::{encode, EncodingKey, Header};
    use uuid::Uuid;

    pub(crate) const SECRET: &str = "segredo-de-teste";

    pub(crate) fn token_for(id: Uuid, role: Role, secret: &str, ttl_secs: i64) -> String {
        let now = Utc::now().timestamp();
        let claims = Claims {
            sub: id,
            role,
            exp: (now + ttl_secs) as usize,
            iat: now as usize,
        };
        encode(&Header::default(), &claims, &EncodingKey::from_secret(secret.as_ref())).unwrap()
    }

    #[test]
    fn valid_token_yields_identity() {
        let id = Uuid::new_v4();
        let service = AuthService::new(SECRET.into());

        let caller = service.validate_token(&token_for(id, Role::Manager, SECRET, 3600)).unwrap();

        assert_eq!(caller, CallerIdentity { id, role: Role::Manager });
    }

    #[test]
    fn wrong_secret_is_rejected() {
        let service = AuthService::new(SECRET.into());
        let token = token_for(Uuid::new_v4(), Role::Admin, "outro-segredo", 3600);

        assert!(matches!(service.validate_token(&token), Err(AppError::InvalidToken)));
    }

    #[test]
    fn expired_token_is_rejected() {
        let service = AuthService::new(SECRET.into());
        // Bem além da folga padrão de 60s
        let token = token_for(Uuid::new_v4(), Role::Admin, SECRET, -3600);

        assert!(matches!(service.validate_token(&token), Err(AppError::InvalidToken)));
    }

    #[test]
    fn garbage_is_rejected() {
        let service = AuthService::new(SECRET.into());
        assert!(service.validate_token("não-é-um-jwt").is_err());
    }
}
