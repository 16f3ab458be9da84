use std::collections::HashMap;

use axum::http::{header, HeaderMap};

/// Identity of whoever issued the request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Viewer {
    Anonymous,
    Editor { name: String },
}

impl Viewer {
    pub fn is_authenticated(&self) -> bool {
        matches!(self, Viewer::Editor { .. })
    }

    pub fn editor_name(&self) -> Option<&str> {
        match self {
            Viewer::Editor { name } => Some(name.as_str()),
            Viewer::Anonymous => None,
        }
    }
}

/// Bearer tokens that identify site editors.
#[derive(Debug, Clone, Default)]
pub struct EditorTokens {
    by_token: HashMap<String, String>,
}

impl EditorTokens {
    /// Build from `(name, token)` pairs.
    pub fn new<I, N, T>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (N, T)>,
        N: Into<String>,
        T: Into<String>,
    {
        let by_token = pairs
            .into_iter()
            .map(|(name, token)| (token.into(), name.into()))
            .collect();
        Self { by_token }
    }

    pub fn is_empty(&self) -> bool {
        self.by_token.is_empty()
    }

    pub fn identify(&self, token: &str) -> Viewer {
        match self.by_token.get(token) {
            Some(name) => Viewer::Editor { name: name.clone() },
            None => Viewer::Anonymous,
        }
    }

    /// Resolve the viewer from an `Authorization: Bearer <token>` header.
    pub fn identify_headers(&self, headers: &HeaderMap) -> Viewer {
        headers
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix("Bearer "))
            .map(|token| self.identify(token.trim()))
            .unwrap_or(Viewer::Anonymous)
    }
}
