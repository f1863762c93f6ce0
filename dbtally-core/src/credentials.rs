//! MySQL credentials from the per-user defaults file.
//!
//! The MySQL provider takes its credentials from `~/.my.cnf` the way the
//! stock client tools do: the `[client]` section supplies `user`,
//! `password`, `host`, and `port`. sqlx has no defaults-file support, so
//! the relevant subset of the format is parsed here. A missing file or
//! missing keys fall back to `root@localhost:3306` with no password.

use crate::error::DbTallyError;
use crate::Result;
use std::path::PathBuf;

/// Credentials resolved for the MySQL connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MySqlCredentials {
    /// Login user.
    pub user: String,
    /// Login password, if the defaults file carries one.
    pub password: Option<String>,
    /// Server host.
    pub host: String,
    /// Server port.
    pub port: u16,
}

impl Default for MySqlCredentials {
    fn default() -> Self {
        Self {
            user: "root".to_string(),
            password: None,
            host: "localhost".to_string(),
            port: 3306,
        }
    }
}

impl MySqlCredentials {
    /// Builds a `mysql://` connection URL from the credentials.
    ///
    /// The URL is assembled through [`url::Url`] so that reserved
    /// characters in the user or password are percent-encoded rather than
    /// corrupting the URL.
    ///
    /// # Errors
    /// Returns a configuration error if the host is not a valid URL host.
    pub fn connection_url(&self) -> Result<String> {
        let mut url = url::Url::parse("mysql://localhost")
            .map_err(|e| DbTallyError::configuration(format!("invalid base URL: {e}")))?;

        url.set_host(Some(&self.host)).map_err(|e| {
            DbTallyError::configuration(format!("invalid MySQL host '{}': {e}", self.host))
        })?;
        let _ = url.set_port(Some(self.port));
        let _ = url.set_username(&self.user);
        let _ = url.set_password(self.password.as_deref());

        Ok(url.to_string())
    }
}

/// Path of the per-user defaults file, `$HOME/.my.cnf`.
fn defaults_file_path() -> Option<PathBuf> {
    std::env::var_os("HOME").map(|home| PathBuf::from(home).join(".my.cnf"))
}

/// Loads MySQL credentials from `~/.my.cnf`.
///
/// A missing file is not an error: the driver defaults are returned. An
/// unreadable file is a configuration error, since silently ignoring a
/// present-but-broken credentials file would lead to confusing
/// authentication failures.
///
/// # Errors
/// Returns a configuration error if the file exists but cannot be read.
pub fn load_defaults_file() -> Result<MySqlCredentials> {
    let Some(path) = defaults_file_path() else {
        tracing::debug!("HOME not set; using driver default credentials");
        return Ok(MySqlCredentials::default());
    };

    match std::fs::read_to_string(&path) {
        Ok(contents) => {
            tracing::debug!("reading MySQL credentials from {}", path.display());
            Ok(parse_defaults(&contents))
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!("{} not found; using driver default credentials", path.display());
            Ok(MySqlCredentials::default())
        }
        Err(e) => Err(DbTallyError::configuration(format!(
            "cannot read {}: {e}",
            path.display()
        ))),
    }
}

/// Parses the `[client]` section of a MySQL defaults file.
///
/// Recognized keys: `user`, `password`, `host`, `port`. Lines are
/// `key = value` (or bare `key`, which is ignored here), `#` and `;` start
/// comments, other sections are skipped, and a later duplicate key wins.
/// Values may be wrapped in single or double quotes.
pub fn parse_defaults(contents: &str) -> MySqlCredentials {
    let mut credentials = MySqlCredentials::default();
    let mut in_client_section = false;

    for raw_line in contents.lines() {
        let line = raw_line.trim();
        if line.is_empty() || line.starts_with('#') || line.starts_with(';') {
            continue;
        }

        if line.starts_with('[') {
            in_client_section = line.eq_ignore_ascii_case("[client]");
            continue;
        }
        if !in_client_section {
            continue;
        }

        let Some((key, value)) = line.split_once('=') else {
            continue;
        };
        let key = key.trim().to_ascii_lowercase();
        let value = unquote(value.trim());

        match key.as_str() {
            "user" => credentials.user = value.to_string(),
            "password" => credentials.password = Some(value.to_string()),
            "host" => credentials.host = value.to_string(),
            "port" => match value.parse::<u16>() {
                Ok(port) => credentials.port = port,
                Err(_) => {
                    tracing::warn!("ignoring invalid port '{}' in defaults file", value);
                }
            },
            _ => {}
        }
    }

    credentials
}

/// Strips one matching pair of single or double quotes.
fn unquote(value: &str) -> &str {
    let bytes = value.as_bytes();
    if bytes.len() >= 2 {
        let (first, last) = (bytes[0], bytes[bytes.len() - 1]);
        if (first == b'"' && last == b'"') || (first == b'\'' && last == b'\'') {
            return &value[1..value.len() - 1];
        }
    }
    value
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_client_section() {
        let contents = "\
[client]
user = reporter
password = s3cret
host = db.internal
port = 3307
";
        let credentials = parse_defaults(contents);

        assert_eq!(credentials.user, "reporter");
        assert_eq!(credentials.password.as_deref(), Some("s3cret"));
        assert_eq!(credentials.host, "db.internal");
        assert_eq!(credentials.port, 3307);
    }

    #[test]
    fn test_other_sections_ignored() {
        let contents = "\
[mysqldump]
user = dumper

[client]
user = reporter

[mysql]
password = nope
";
        let credentials = parse_defaults(contents);

        assert_eq!(credentials.user, "reporter");
        assert!(credentials.password.is_none());
    }

    #[test]
    fn test_comments_quotes_and_duplicates() {
        let contents = "\
[client]
# primary account
user = 'first'
; overridden below
user = \"second\"
password = \"with = sign\"
";
        let credentials = parse_defaults(contents);

        assert_eq!(credentials.user, "second");
        assert_eq!(credentials.password.as_deref(), Some("with = sign"));
    }

    #[test]
    fn test_invalid_port_falls_back_to_default() {
        let contents = "[client]\nport = not-a-number\n";
        let credentials = parse_defaults(contents);
        assert_eq!(credentials.port, 3306);
    }

    #[test]
    fn test_empty_contents_yield_defaults() {
        assert_eq!(parse_defaults(""), MySqlCredentials::default());
    }

    #[test]
    fn test_connection_url_without_password() {
        let credentials = MySqlCredentials::default();
        let url = credentials.connection_url().unwrap();
        assert_eq!(url, "mysql://root@localhost:3306");
    }

    #[test]
    fn test_connection_url_encodes_password() {
        let credentials = MySqlCredentials {
            user: "reporter".to_string(),
            password: Some("p@ss/word".to_string()),
            host: "db.internal".to_string(),
            port: 3307,
        };
        let url = credentials.connection_url().unwrap();

        assert!(url.starts_with("mysql://reporter:"));
        assert!(url.ends_with("@db.internal:3307"));
        assert!(!url.contains("p@ss/word"));
    }
}
