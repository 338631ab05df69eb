//! Access-proxy credentials from TOML (`[access]` section)

use crate::a2a::AccessCredentials;
use serde::{Deserialize, Serialize};

/// Raw access configuration from TOML
///
/// Both values are forwarded as request headers when set. They are usually
/// supplied through `RELAY_ACCESS__CLIENT_ID` / `RELAY_ACCESS__CLIENT_SECRET`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileAccessConfig {
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
}

impl FileAccessConfig {
    fn id(&self) -> Option<&str> {
        self.client_id.as_deref().filter(|s| !s.is_empty())
    }

    fn secret(&self) -> Option<&str> {
        self.client_secret.as_deref().filter(|s| !s.is_empty())
    }

    /// True when only one of the two values is set.
    pub fn is_partial(&self) -> bool {
        self.id().is_some() != self.secret().is_some()
    }

    pub fn credentials(&self) -> Option<AccessCredentials> {
        Some(AccessCredentials {
            client_id: self.id()?.to_string(),
            client_secret: self.secret()?.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_credentials_require_both_values() {
        let access = FileAccessConfig {
            client_id: Some("id".to_string()),
            client_secret: None,
        };
        assert!(access.is_partial());
        assert!(access.credentials().is_none());

        let access = FileAccessConfig {
            client_id: Some("id".to_string()),
            client_secret: Some("secret".to_string()),
        };
        assert!(!access.is_partial());
        assert_eq!(access.credentials().unwrap().client_secret, "secret");

        assert!(!FileAccessConfig::default().is_partial());
    }
}
