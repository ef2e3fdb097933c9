// src/middleware/rbac.rs

use axum::{
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
};
use std::marker::PhantomData;

use crate::{
    common::error::{ApiError, AppError},
    config::AppState,
    middleware::i18n::Locale,
    models::auth::{CallerIdentity, Role},
};

/// 1. O Trait que define quem pode passar
pub trait RoleDef: Send + Sync + 'static {
    fn allows(role: Role) -> bool;
}

/// 2. O Extractor (Guardião). Carrega a identidade já validada.
pub struct RequireRole<T> {
    pub caller: CallerIdentity,
    _role: PhantomData<T>,
}

// 3. Implementação do FromRequestParts
impl<T, S> FromRequestParts<S> for RequireRole<T>
where
    T: RoleDef,
    S: Send + Sync,
    AppState: FromRef<S>,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let app_state = AppState::from_ref(state);
        let locale = Locale::from_request_parts(parts, state)
            .await
            .unwrap_or_else(|never| match never {});

        // A. Identidade colocada pelo auth_guard
        let caller = parts
            .extensions
            .get::<CallerIdentity>()
            .copied()
            .ok_or_else(|| AppError::InvalidToken.to_api_error(&locale, &app_state.i18n_store))?;

        // B. Perfil
        if !T::allows(caller.role) {
            return Err(AppError::Forbidden("auth.insufficient_role").to_api_error(&locale, &app_state.i18n_store));
        }

        Ok(RequireRole { caller, _role: PhantomData })
    }
}

// ---
// DEFINIÇÃO DOS PERFIS (TIPOS)
// ---

/// Qualquer membro da equipe (OPERATOR ou acima)
pub struct StaffAccess;
impl RoleDef for StaffAccess {
    fn allows(role: Role) -> bool { role.is_staff() }
}

pub struct OperatorAccess;
impl RoleDef for OperatorAccess {
    fn allows(role: Role) -> bool { role.at_least(Role::Operator) }
}

pub struct ManagerAccess;
impl RoleDef for ManagerAccess {
    fn allows(role: Role) -> bool { role.at_least(Role::Manager) }
}

pub struct AdminAccess;
impl RoleDef for AdminAccess {
    fn allows(role: Role) -> bool { role.at_least(Role::Admin) }
}

pub struct RepresentativeAccess;
impl RoleDef for RepresentativeAccess {
    fn allows(role: Role) -> bool { role == Role::Representative }
}

/// Qualquer perfil autenticado
pub struct AnyRole;
impl RoleDef for AnyRole {
    fn allows(_role: Role) -> bool { true }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn guards_follow_the_hierarchy() {
        assert!(ManagerAccess::allows(Role::SuperAdmin));
        assert!(ManagerAccess::allows(Role::Manager));
        assert!(!ManagerAccess::allows(Role::Operator));
        assert!(!AdminAccess::allows(Role::Manager));
        assert!(OperatorAccess::allows(Role::Operator));
    }

    #[test]
    fn representatives_only_pass_their_own_guard() {
        assert!(RepresentativeAccess::allows(Role::Representative));
        assert!(!StaffAccess::allows(Role::Representative));
        assert!(!RepresentativeAccess::allows(Role::SuperAdmin));
        assert!(AnyRole::allows(Role::Representative));
    }
}
