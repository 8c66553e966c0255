use serde::{Deserialize, Serialize};

use crate::services::sso::SsoPayload;

#[derive(Debug, Deserialize)]
pub struct SsoRedirectQuery {
    pub return_path: Option<String>,
}

impl SsoRedirectQuery {
    /// Only local absolute paths are remembered; anything else falls back to `/`.
    pub fn return_path(&self) -> &str {
        match self.return_path.as_deref() {
            Some(path) if path.starts_with('/') && !path.starts_with("//") => path,
            _ => "/",
        }
    }
}

#[derive(Debug, Serialize)]
pub struct SsoLoginResponse {
    pub payload: SsoPayload,
    pub return_path: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn query(path: Option<&str>) -> SsoRedirectQuery {
        SsoRedirectQuery {
            return_path: path.map(str::to_string),
        }
    }

    #[test]
    fn return_path_stays_local() {
        assert_eq!(query(None).return_path(), "/");
        assert_eq!(query(Some("/t/topic/1")).return_path(), "/t/topic/1");
        assert_eq!(query(Some("//evil.example")).return_path(), "/");
        assert_eq!(query(Some("https://evil.example")).return_path(), "/");
    }
}
