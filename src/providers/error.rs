use std::fmt;

/// Classified HTTP collaborator error: tells the caller *why* an LLM or speech
/// call failed so the user gets a meaningful one-line reason.
#[derive(Debug)]
pub struct ProviderError {
    pub kind: ProviderErrorKind,
    pub status: Option<u16>,
    pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderErrorKind {
    /// 401/403: bad API key or permissions.
    Auth,
    /// 402: billing/quota exhausted.
    Billing,
    /// 429: rate limited.
    RateLimit,
    /// 404 or "model not found": bad model or voice id.
    NotFound,
    /// 408, request timeout, or provider took too long.
    Timeout,
    /// Connection refused, DNS failure, reset, etc.
    Network,
    /// 500/502/503/504: provider-side outage.
    ServerError,
    /// Anything else.
    Unknown,
}

impl ProviderError {
    pub fn from_status(status: u16, body: &str) -> Self {
        let kind = match status {
            401 | 403 => ProviderErrorKind::Auth,
            402 => ProviderErrorKind::Billing,
            404 => ProviderErrorKind::NotFound,
            408 => ProviderErrorKind::Timeout,
            429 => ProviderErrorKind::RateLimit,
            500 | 502 | 503 | 504 => ProviderErrorKind::ServerError,
            _ => ProviderErrorKind::Unknown,
        };

        Self {
            kind,
            status: Some(status),
            message: truncate_body(body),
        }
    }

    pub fn network(err: &reqwest::Error) -> Self {
        let kind = if err.is_timeout() {
            ProviderErrorKind::Timeout
        } else {
            ProviderErrorKind::Network
        };
        Self {
            kind,
            status: None,
            message: err.to_string(),
        }
    }

    /// User-facing summary suitable for a chat reply.
    pub fn user_message(&self) -> String {
        match self.kind {
            ProviderErrorKind::Auth => "сервис отклонил ключ API".to_string(),
            ProviderErrorKind::Billing => "исчерпан баланс сервиса".to_string(),
            ProviderErrorKind::RateLimit => "слишком много запросов, попробуйте позже".to_string(),
            ProviderErrorKind::NotFound => "модель или голос не найдены".to_string(),
            ProviderErrorKind::Timeout => "сервис не ответил вовремя".to_string(),
            ProviderErrorKind::Network => "сервис недоступен (ошибка сети)".to_string(),
            ProviderErrorKind::ServerError => "сбой на стороне сервиса".to_string(),
            ProviderErrorKind::Unknown => match self.status {
                Some(status) => format!("ошибка API (статус {}): {}", status, self.message),
                None => self.message.clone(),
            },
        }
    }
}

impl fmt::Display for ProviderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(status) = self.status {
            write!(f, "Provider error ({}, {:?}): {}", status, self.kind, self.message)
        } else {
            write!(f, "Provider error ({:?}): {}", self.kind, self.message)
        }
    }
}

impl std::error::Error for ProviderError {}

/// Human-readable reason for a collaborator failure. Classified provider
/// errors get their short summary; anything else falls back to `Display`.
pub fn describe_error(err: &anyhow::Error) -> String {
    match err.downcast_ref::<ProviderError>() {
        Some(provider_err) => provider_err.user_message(),
        None => err.to_string(),
    }
}

fn truncate_body(body: &str) -> String {
    crate::utils::truncate_str(body, 300)
}
