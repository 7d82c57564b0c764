//! Domain-level error type used by the lobby registry and turn engine.
//!
//! This error type is HTTP- and transport-agnostic. Route handlers convert
//! it into `AppError`; the WebSocket session turns it into a `lobby_error`
//! frame for the requesting connection only.

use std::error::Error;
use std::fmt::{Display, Formatter, Result as FmtResult};

use crate::errors::ErrorCode;

/// Missing resources in domain terms
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum NotFoundKind {
    Lobby,
    Other(String),
}

/// Requests that collide with current lobby state
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ConflictKind {
    LobbyFull,
    NicknameTaken,
    GameAlreadyActive,
    Other(String),
}

/// Requests from a member lacking the required role in the lobby
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ForbiddenKind {
    NotHost,
    NotYourTurn,
}

/// Business rule or input violations
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ValidationKind {
    NotEnoughPlayers,
    NotActive,
    InvalidBound,
    InvalidNickname,
    InvalidLobbyId,
    Other(String),
}

/// Central domain error type
#[derive(Debug, Clone, PartialEq)]
pub enum DomainError {
    Validation(ValidationKind, String),
    Conflict(ConflictKind, String),
    NotFound(NotFoundKind, String),
    Forbidden(ForbiddenKind, String),
}

impl Display for DomainError {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            DomainError::Validation(kind, d) => write!(f, "validation {kind:?}: {d}"),
            DomainError::Conflict(kind, d) => write!(f, "conflict {kind:?}: {d}"),
            DomainError::NotFound(kind, d) => write!(f, "not found {kind:?}: {d}"),
            DomainError::Forbidden(kind, d) => write!(f, "forbidden {kind:?}: {d}"),
        }
    }
}

impl Error for DomainError {}

impl DomainError {
    pub fn validation(kind: ValidationKind, detail: impl Into<String>) -> Self {
        Self::Validation(kind, detail.into())
    }
    pub fn conflict(kind: ConflictKind, detail: impl Into<String>) -> Self {
        Self::Conflict(kind, detail.into())
    }
    pub fn not_found(kind: NotFoundKind, detail: impl Into<String>) -> Self {
        Self::NotFound(kind, detail.into())
    }
    pub fn forbidden(kind: ForbiddenKind, detail: impl Into<String>) -> Self {
        Self::Forbidden(kind, detail.into())
    }

    pub fn lobby_not_found(lobby_id: impl Display) -> Self {
        Self::not_found(NotFoundKind::Lobby, format!("Lobby {lobby_id} not found"))
    }

    /// The single error code this error is reported under.
    pub fn code(&self) -> ErrorCode {
        match self {
            DomainError::Validation(kind, _) => match kind {
                ValidationKind::NotEnoughPlayers => ErrorCode::NotEnoughPlayers,
                ValidationKind::NotActive => ErrorCode::NotActive,
                ValidationKind::InvalidBound => ErrorCode::InvalidBound,
                ValidationKind::InvalidNickname => ErrorCode::InvalidNickname,
                ValidationKind::InvalidLobbyId => ErrorCode::InvalidLobbyId,
                ValidationKind::Other(_) => ErrorCode::ValidationError,
            },
            DomainError::Conflict(kind, _) => match kind {
                ConflictKind::LobbyFull => ErrorCode::LobbyFull,
                ConflictKind::NicknameTaken => ErrorCode::NicknameTaken,
                ConflictKind::GameAlreadyActive => ErrorCode::GameAlreadyActive,
                ConflictKind::Other(_) => ErrorCode::BadRequest,
            },
            DomainError::NotFound(kind, _) => match kind {
                NotFoundKind::Lobby => ErrorCode::LobbyNotFound,
                NotFoundKind::Other(_) => ErrorCode::NotFound,
            },
            DomainError::Forbidden(kind, _) => match kind {
                ForbiddenKind::NotHost => ErrorCode::NotHost,
                ForbiddenKind::NotYourTurn => ErrorCode::NotYourTurn,
            },
        }
    }

    /// Human-readable detail, without the kind prefix used by `Display`.
    pub fn detail(&self) -> &str {
        match self {
            DomainError::Validation(_, d)
            | DomainError::Conflict(_, d)
            | DomainError::NotFound(_, d)
            | DomainError::Forbidden(_, d) => d,
        }
    }
}
