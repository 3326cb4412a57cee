use serde::{Deserialize, Serialize};

use crate::error::SqlHandleError;

pub const DEFAULT_CHARSET: &str = "utf8mb4";
pub const DEFAULT_COLLATION: &str = "utf8mb4_unicode_ci";

/// Options used to open (and later reopen) a connection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectOptions {
    pub host: String,
    pub user: String,
    #[serde(default)]
    pub pass: String,
    pub dbname: String,
    #[serde(default)]
    pub port: Option<u16>,
    #[serde(default = "default_charset")]
    pub charset: String,
    #[serde(default = "default_collation")]
    pub collation: String,
}

fn default_charset() -> String {
    DEFAULT_CHARSET.to_string()
}

fn default_collation() -> String {
    DEFAULT_COLLATION.to_string()
}

impl ConnectOptions {
    /// Options with the default port, charset and collation.
    #[must_use]
    pub fn new(
        host: impl Into<String>,
        user: impl Into<String>,
        pass: impl Into<String>,
        dbname: impl Into<String>,
    ) -> Self {
        Self {
            host: host.into(),
            user: user.into(),
            pass: pass.into(),
            dbname: dbname.into(),
            port: None,
            charset: default_charset(),
            collation: default_collation(),
        }
    }

    #[must_use]
    pub fn builder(
        host: impl Into<String>,
        user: impl Into<String>,
        pass: impl Into<String>,
        dbname: impl Into<String>,
    ) -> ConnectOptionsBuilder {
        ConnectOptionsBuilder {
            opts: Self::new(host, user, pass, dbname),
        }
    }

    /// Parse options from a JSON document.
    ///
    /// # Errors
    ///
    /// Returns `SqlHandleError::Database` if the document is not valid options JSON.
    pub fn from_json(json: &str) -> Result<Self, SqlHandleError> {
        serde_json::from_str(json)
            .map_err(|e| SqlHandleError::database(format!("invalid connection options: {e}")))
    }
}

/// Fluent builder for [`ConnectOptions`].
#[derive(Debug, Clone)]
pub struct ConnectOptionsBuilder {
    opts: ConnectOptions,
}

impl ConnectOptionsBuilder {
    #[must_use]
    pub fn port(mut self, port: u16) -> Self {
        self.opts.port = Some(port);
        self
    }

    #[must_use]
    pub fn charset(mut self, charset: impl Into<String>) -> Self {
        self.opts.charset = charset.into();
        self
    }

    #[must_use]
    pub fn collation(mut self, collation: impl Into<String>) -> Self {
        self.opts.collation = collation.into();
        self
    }

    #[must_use]
    pub fn finish(self) -> ConnectOptions {
        self.opts
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_uses_default_charset_and_collation() {
        let opts = ConnectOptions::new("localhost", "app", "secret", "shop");
        assert_eq!(opts.charset, "utf8mb4");
        assert_eq!(opts.collation, "utf8mb4_unicode_ci");
        assert_eq!(opts.port, None);
    }

    #[test]
    fn builder_overrides_defaults() {
        let opts = ConnectOptions::builder("db", "u", "p", "n")
            .port(3307)
            .charset("utf8")
            .collation("utf8_general_ci")
            .finish();
        assert_eq!(opts.port, Some(3307));
        assert_eq!(opts.charset, "utf8");
        assert_eq!(opts.collation, "utf8_general_ci");
    }

    #[test]
    fn json_fills_in_defaults() {
        let opts = ConnectOptions::from_json(r#"{"host":"h","user":"u","dbname":"d"}"#).unwrap();
        assert_eq!(opts.pass, "");
        assert_eq!(opts.charset, DEFAULT_CHARSET);
        assert!(ConnectOptions::from_json("{}").is_err());
    }
}
