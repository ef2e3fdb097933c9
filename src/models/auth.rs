// src/models/auth.rs

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// Perfis aceitos no token. A equipe interna segue a hierarquia
/// SUPER_ADMIN > ADMIN > MANAGER > OPERATOR; representantes ficam fora dela.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    SuperAdmin,
    Admin,
    Manager,
    Operator,
    Representative,
}

impl Role {
    /// Nível na hierarquia da equipe (None para representantes).
    pub fn staff_level(&self) -> Option<u8> {
        match self {
            Role::SuperAdmin => Some(4),
            Role::Admin => Some(3),
            Role::Manager => Some(2),
            Role::Operator => Some(1),
            Role::Representative => None,
        }
    }

    pub fn is_staff(&self) -> bool {
        self.staff_level().is_some()
    }

    /// `true` se este perfil é da equipe e está no nível `minimum` ou acima.
    pub fn at_least(&self, minimum: Role) -> bool {
        match (self.staff_level(), minimum.staff_level()) {
            (Some(mine), Some(required)) => mine >= required,
            _ => false,
        }
    }
}

// Estrutura de dados ("claims") dentro do JWT emitido pelo serviço de autenticação
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,  // Subject (ID do usuário ou do representante)
    pub role: Role,
    pub exp: usize, // Expiration time
    pub iat: usize, // Issued At
}

/// Identidade de quem chama, já validada pelo middleware.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CallerIdentity {
    pub id: Uuid,
    pub role: Role,
}

impl From<Claims> for CallerIdentity {
    fn from(claims: Claims) -> Self {
        Self { id: claims.sub, role: claims.role }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn staff_hierarchy_is_ordered() {
        assert!(Role::SuperAdmin.at_least(Role::Admin));
        assert!(Role::Admin.at_least(Role::Manager));
        assert!(Role::Manager.at_least(Role::Manager));
        assert!(!Role::Operator.at_least(Role::Manager));
    }

    #[test]
    fn representatives_are_outside_the_hierarchy() {
        assert!(!Role::Representative.is_staff());
        assert!(!Role::Representative.at_least(Role::Operator));
        assert!(!Role::Admin.at_least(Role::Representative));
    }

    #[test]
    fn role_uses_screaming_snake_case_on_the_wire() {
        let role: Role = serde_json::from_str("\"SUPER_ADMIN\"").expect("role válido");
        assert_eq!(role, Role::SuperAdmin);
    }
}
