use serde::Serialize;
use thiserror::Error;

/// 查询歧义时展示给用户的固定提示
pub const AMBIGUOUS_MESSAGE: &str =
    "Podane zapytanie jest dwuznaczne. Proszę wybrać bardziej konkretny termin.";

/// 未找到页面时展示给用户的固定提示
pub const NOT_FOUND_MESSAGE: &str = "Nie znaleziono strony na Wikipedii dla podanego zapytania.";

/// 百科摘要
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Summary {
    pub title: String,
    pub text: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LookupErrorKind {
    Ambiguous,
    NotFound,
    Other,
}

#[derive(Error, Debug)]
pub enum LookupError {
    #[error("'{0}' may refer to multiple pages")]
    Ambiguous(String),

    #[error("No page matches '{0}'")]
    NotFound(String),

    #[error("Lookup service request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Lookup service error: {0}")]
    Service(String),
}

impl LookupError {
    pub fn kind(&self) -> LookupErrorKind {
        match self {
            LookupError::Ambiguous(_) => LookupErrorKind::Ambiguous,
            LookupError::NotFound(_) => LookupErrorKind::NotFound,
            LookupError::Transport(_) | LookupError::Service(_) => LookupErrorKind::Other,
        }
    }
}
