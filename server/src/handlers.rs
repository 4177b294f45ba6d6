//! Downstream handlers behind the admission gate

use axum::http::StatusCode;
use chrono::{Local, SecondsFormat};

/// Body prefix of an admitted request
pub const PROCESSED_PREFIX: &str = "This is a server with rate limit - Request processed at ";

/// `GET` on any path
pub async fn root() -> String {
    format!(
        "{PROCESSED_PREFIX}{}",
        Local::now().to_rfc3339_opts(SecondsFormat::Secs, false)
    )
}

/// Any other method
pub async fn method_not_allowed() -> (StatusCode, &'static str) {
    (StatusCode::METHOD_NOT_ALLOWED, "Method not allowed")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_root_body_has_rfc3339_timestamp() {
        let body = root().await;
        let timestamp = body
            .strip_prefix(PROCESSED_PREFIX)
            .expect("body starts with prefix");

        assert!(chrono::DateTime::parse_from_rfc3339(timestamp).is_ok(), "{timestamp}");
    }

    #[tokio::test]
    async fn test_method_not_allowed() {
        let (status, body) = method_not_allowed().await;
        assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(body, "Method not allowed");
    }
}
