//! Tenant identity and per-request connection parameters.
//!
//! A tenant is identified by an opaque string key supplied by the caller. The
//! gateway never validates its shape: the empty string is a legal key, and an
//! omitted `tenantName` resolves to it.
//!
//! Connection parameters arrive with every request and are never persisted.
//! They only matter the first time a tenant is seen, when the registry opens a
//! pool with them.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Default MySQL port used when `host` carries no explicit port.
pub const DEFAULT_MYSQL_PORT: u16 = 3306;

/// Registry key for a logical tenant
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TenantKey(String);

impl TenantKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    /// Resolve the key from an optional request field.
    ///
    /// A missing tenant name maps to the empty-string key.
    pub fn from_optional(name: Option<String>) -> Self {
        name.map(Self).unwrap_or_default()
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TenantKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TenantKey {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for TenantKey {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// Connection fields as received, before validation
#[derive(Clone, Default, Deserialize)]
pub struct ConnectionFields {
    #[serde(default)]
    pub host: Option<String>,
    #[serde(default)]
    pub user: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default)]
    pub database: Option<String>,
}

impl ConnectionFields {
    /// Validate into params. `None` if any field is absent or empty.
    pub fn into_params(self) -> Option<ConnectionParams> {
        ConnectionParams::from_parts(self.host, self.user, self.password, self.database)
    }
}

impl fmt::Debug for ConnectionFields {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionFields")
            .field("host", &self.host)
            .field("user", &self.user)
            .field("password", &self.password.as_ref().map(|_| "***"))
            .field("database", &self.database)
            .finish()
    }
}

impl From<ConnectionParams> for ConnectionFields {
    fn from(params: ConnectionParams) -> Self {
        Self {
            host: Some(params.host),
            user: Some(params.user),
            password: Some(params.password),
            database: Some(params.database),
        }
    }
}

/// Credentials needed to open a tenant pool
#[derive(Clone, PartialEq, Eq)]
pub struct ConnectionParams {
    pub host: String,
    pub user: String,
    pub password: String,
    pub database: String,
}

impl ConnectionParams {
    /// Build params from optional request fields.
    ///
    /// Returns `None` if any field is absent or empty.
    pub fn from_parts(
        host: Option<String>,
        user: Option<String>,
        password: Option<String>,
        database: Option<String>,
    ) -> Option<Self> {
        Some(Self {
            host: non_empty(host)?,
            user: non_empty(user)?,
            password: non_empty(password)?,
            database: non_empty(database)?,
        })
    }

    /// Split `host` into hostname and port.
    ///
    /// Accepts `db1`, `db1:3307`, and bracketed IPv6 such as `[::1]:3307`.
    /// A bare IPv6 address without brackets is taken as a hostname.
    pub fn host_and_port(&self) -> (&str, u16) {
        let host = self.host.as_str();

        if let Some(rest) = host.strip_prefix('[') {
            if let Some((addr, tail)) = rest.split_once(']') {
                let port = tail
                    .strip_prefix(':')
                    .and_then(|p| p.parse().ok())
                    .unwrap_or(DEFAULT_MYSQL_PORT);
                return (addr, port);
            }
        }

        match host.rsplit_once(':') {
            Some((name, port)) if !name.contains(':') => match port.parse() {
                Ok(port) => (name, port),
                Err(_) => (host, DEFAULT_MYSQL_PORT),
            },
            _ => (host, DEFAULT_MYSQL_PORT),
        }
    }

    /// Connection target with the password left out, for logs and stats.
    pub fn display_target(&self) -> String {
        format!("{}@{}/{}", self.user, self.host, self.database)
    }
}

impl fmt::Debug for ConnectionParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionParams")
            .field("host", &self.host)
            .field("user", &self.user)
            .field("password", &"***")
            .field("database", &self.database)
            .finish()
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}
