//! 엔진 오류 분류.
//! 디스패치 계층은 `kind()`와 메시지를 그대로 노출한다.

use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

pub type EngineResult<T> = Result<T, EngineError>;

#[derive(Debug, Error)]
pub enum EngineError {
    /// 파일은 존재하지만 JSON 파싱에 실패함(부재로 취급하지 않는다)
    #[error("malformed document at {path}: {source}")]
    MalformedDocument {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("Backup not found: {0}")]
    BackupNotFound(String),
    #[error("Invalid backup file: {0}")]
    InvalidBackup(String),
    #[error("Unknown config type: {0}")]
    UnknownConfigType(String),
    /// 최초 설정 시 번들 템플릿이 없음
    #[error("template not found: {}", .0.display())]
    MissingTemplate(PathBuf),
    /// 설정 전이라 대상 문서가 없음
    #[error("{} not found", .0.display())]
    MissingDocument(PathBuf),
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("i/o failure at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// 디스패치 응답에 실리는 오류 종류.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    MalformedDocument,
    BackupNotFound,
    InvalidBackup,
    UnknownConfigType,
    MissingTemplate,
    MissingDocument,
    InvalidInput,
    IoFailure,
}

impl ErrorKind {
    pub fn code(self) -> &'static str {
        match self {
            ErrorKind::MalformedDocument => "MalformedDocument",
            ErrorKind::BackupNotFound => "BackupNotFound",
            ErrorKind::InvalidBackup => "InvalidBackup",
            ErrorKind::UnknownConfigType => "UnknownConfigType",
            ErrorKind::MissingTemplate => "MissingTemplate",
            ErrorKind::MissingDocument => "MissingDocument",
            ErrorKind::InvalidInput => "InvalidInput",
            ErrorKind::IoFailure => "IOFailure",
        }
    }
}

impl EngineError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            EngineError::MalformedDocument { .. } => ErrorKind::MalformedDocument,
            EngineError::BackupNotFound(_) => ErrorKind::BackupNotFound,
            EngineError::InvalidBackup(_) => ErrorKind::InvalidBackup,
            EngineError::UnknownConfigType(_) => ErrorKind::UnknownConfigType,
            EngineError::MissingTemplate(_) => ErrorKind::MissingTemplate,
            EngineError::MissingDocument(_) => ErrorKind::MissingDocument,
            EngineError::InvalidInput(_) => ErrorKind::InvalidInput,
            EngineError::Io { .. } => ErrorKind::IoFailure,
        }
    }

    pub fn io(path: &Path, source: io::Error) -> Self {
        EngineError::Io {
            path: path.to_path_buf(),
            source,
        }
    }

    pub fn malformed(path: &Path, source: serde_json::Error) -> Self {
        EngineError::MalformedDocument {
            path: path.to_path_buf(),
            source,
        }
    }
}
