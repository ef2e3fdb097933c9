// src/common/error.rs

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::{json, Value};
use thiserror::Error;

use crate::{common::i18n::I18nStore, middleware::i18n::Locale};

/// Entidades que podem não existir. O código vira a chave de tradução.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Entity {
    Consumer,
    Generator,
    Representative,
    Commission,
    ChangeRequest,
}

impl Entity {
    pub fn code(&self) -> &'static str {
        match self {
            Entity::Consumer => "not_found.consumer",
            Entity::Generator => "not_found.generator",
            Entity::Representative => "not_found.representative",
            Entity::Commission => "not_found.commission",
            Entity::ChangeRequest => "not_found.change_request",
        }
    }
}

// Nosso tipo de erro, com `thiserror` para melhor ergonomia.
// As variantes de domínio carregam um código estável (ex: "commission.already_paid")
// que é traduzido no momento de montar a resposta.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Erro de validação")]
    ValidationError(#[from] validator::ValidationErrors),

    #[error("Registro não encontrado: {}", .0.code())]
    NotFound(Entity),

    #[error("Entrada inválida: {0}")]
    InvalidInput(&'static str),

    #[error("Estado inválido para a operação: {0}")]
    InvalidState(&'static str),

    #[error("Conflito: {0}")]
    Conflict(&'static str),

    #[error("Operação não permitida: {0}")]
    Forbidden(&'static str),

    #[error("Token inválido")]
    InvalidToken,

    // Variante para erros de banco de dados
    #[error("Erro de banco de dados")]
    DatabaseError(#[from] sqlx::Error),

    // Variante genérica para qualquer outro erro inesperado
    #[error("Erro interno do servidor")]
    InternalServerError(#[from] anyhow::Error),

    #[error("Erro de Bcrypt: {0}")]
    BcryptError(#[from] bcrypt::BcryptError),

    #[error("Erro de JWT: {0}")]
    JwtError(#[from] jsonwebtoken::errors::Error),
}

impl AppError {
    /// Tipo estável do erro, exposto ao cliente junto com a mensagem.
    pub fn kind(&self) -> &'static str {
        match self {
            AppError::ValidationError(_) | AppError::InvalidInput(_) => "INVALID_INPUT",
            AppError::NotFound(_) => "NOT_FOUND",
            AppError::InvalidState(_) => "INVALID_STATE",
            AppError::Conflict(_) => "CONFLICT",
            AppError::Forbidden(_) => "FORBIDDEN",
            AppError::InvalidToken => "UNAUTHORIZED",
            _ => "INTERNAL",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::ValidationError(_) | AppError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::InvalidState(_) | AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::InvalidToken => StatusCode::UNAUTHORIZED,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Código da mensagem no catálogo de traduções.
    pub fn message_code(&self) -> &'static str {
        match self {
            AppError::ValidationError(_) => "validation.failed",
            AppError::NotFound(entity) => entity.code(),
            AppError::InvalidInput(code)
            | AppError::InvalidState(code)
            | AppError::Conflict(code)
            | AppError::Forbidden(code) => *code,
            AppError::InvalidToken => "auth.invalid_token",
            _ => "internal.unexpected",
        }
    }

    /// Converte para a resposta da API, traduzindo a mensagem para o idioma do cliente.
    /// Erros internos são logados aqui e nunca vazam detalhes do banco.
    pub fn to_api_error(&self, locale: &Locale, store: &I18nStore) -> ApiError {
        let status = self.status();
        if status == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!("Erro Interno do Servidor: {:?}", self);
        }

        let details = match self {
            AppError::ValidationError(errors) => Some(validation_details(errors)),
            _ => None,
        };

        ApiError {
            status,
            kind: self.kind(),
            error: store.translate(&locale.0, self.message_code()),
            details,
        }
    }
}

fn validation_details(errors: &validator::ValidationErrors) -> Value {
    let mut details = serde_json::Map::new();
    for (field, field_errors) in errors.field_errors() {
        let messages: Vec<String> = field_errors
            .iter()
            .map(|e| {
                e.message
                    .as_ref()
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| e.code.to_string())
            })
            .collect();
        details.insert(field.to_string(), json!(messages));
    }
    Value::Object(details)
}

/// Erro já pronto para o cliente: status HTTP + mensagem traduzida.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub kind: &'static str,
    pub error: String,
    pub details: Option<Value>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let mut body = json!({
            "error": self.error,
            "kind": self.kind,
        });
        if let Some(details) = self.details {
            body["details"] = details;
        }
        (self.status, Json(body)).into_response()
    }
}

// Usado pelos middlewares, que ainda não conhecem o idioma do cliente.
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = if status == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!("Erro Interno do Servidor: {:?}", self);
            "Ocorreu um erro inesperado.".to_string()
        } else {
            self.to_string()
        };

        let body = Json(json!({ "error": message, "kind": self.kind() }));
        (status, body).into_response()
    }
}

/// Traduz violações de unicidade do Postgres em `Conflict`.
pub(crate) fn map_unique_violation(e: sqlx::Error, code: &'static str) -> AppError {
    if let sqlx::Error::Database(db_err) = &e {
        if db_err.is_unique_violation() {
            return AppError::Conflict(code);
        }
    }
    e.into()
}
