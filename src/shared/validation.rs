use super::error::AppError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// 入力値のバリデーション失敗理由。
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum ValidationFailureKind {
    /// 空文字列、または空白のみの値。
    EmptyContent,
    /// 文字数が上限を超過。
    ContentTooLarge,
}

impl ValidationFailureKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ValidationFailureKind::EmptyContent => "empty_content",
            ValidationFailureKind::ContentTooLarge => "content_too_large",
        }
    }
}

impl fmt::Display for ValidationFailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl AppError {
    pub fn validation(kind: ValidationFailureKind, message: impl Into<String>) -> Self {
        AppError::ValidationError(format!("{kind}: {}", message.into()))
    }
}

/// 本文をトリムし、空・文字数超過を検出する。
pub fn normalize_content(content: &str, max_chars: usize) -> Result<String, AppError> {
    let trimmed = content.trim();
    if trimmed.is_empty() {
        return Err(AppError::validation(
            ValidationFailureKind::EmptyContent,
            "content must not be empty",
        ));
    }
    let length = trimmed.chars().count();
    if length > max_chars {
        return Err(AppError::validation(
            ValidationFailureKind::ContentTooLarge,
            format!("content has {length} characters, limit is {max_chars}"),
        ));
    }
    Ok(trimmed.to_string())
}
