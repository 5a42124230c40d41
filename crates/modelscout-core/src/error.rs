//! 错误类型
//!
//! 致命错误（配置、结果表）在任何持久化状态被修改前返回；
//! 单文件的读取/解码失败不在此列，由 `SourceFile::read` 记录日志后跳过。
use std::path::PathBuf;

/// 扫描过程中的致命错误
#[derive(Debug, thiserror::Error)]
pub enum ScanError {
    #[error("corpus root does not exist or is not a directory: {}", .0.display())]
    MissingCorpusRoot(PathBuf),

    #[error("project root does not exist or is not a directory: {}", .0.display())]
    MissingProjectRoot(PathBuf),

    #[error("library dictionary not found: {}", .0.display())]
    MissingDictionary(PathBuf),

    #[error("invalid library dictionary {}: {message}", .path.display())]
    InvalidDictionary { path: PathBuf, message: String },

    #[error("invalid config {}: {message}", .path.display())]
    InvalidConfig { path: PathBuf, message: String },

    #[error("invalid result table {}: {message}", .path.display())]
    InvalidResultTable { path: PathBuf, message: String },

    #[error("invalid oracle {}: {message}", .path.display())]
    InvalidOracle { path: PathBuf, message: String },

    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("CSV error on {}: {source}", .path.display())]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
}

impl ScanError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io { path: path.into(), source }
    }

    pub(crate) fn csv(path: impl Into<PathBuf>, source: csv::Error) -> Self {
        Self::Csv { path: path.into(), source }
    }
}

pub type Result<T> = std::result::Result<T, ScanError>;
