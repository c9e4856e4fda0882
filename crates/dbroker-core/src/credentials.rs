//! Connection credentials and URI composition

use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use serde::{Deserialize, Serialize};

/// Characters left unescaped in userinfo and path segments (RFC 3986 unreserved)
const UNRESERVED: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');

/// Credentials handed to a bound application
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    pub protocol: String,
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    pub database: String,
    pub uri: String,
}

impl Credentials {
    /// Assemble credentials and compose their URI
    pub fn new(
        protocol: impl Into<String>,
        host: impl Into<String>,
        port: u16,
        username: impl Into<String>,
        password: impl Into<String>,
        database: impl Into<String>,
    ) -> Self {
        let mut creds = Self {
            protocol: protocol.into(),
            host: host.into(),
            port,
            username: username.into(),
            password: password.into(),
            database: database.into(),
            uri: String::new(),
        };
        creds.uri = build_uri(
            &creds.protocol,
            &creds.host,
            creds.port,
            &creds.username,
            &creds.password,
            &creds.database,
        );
        creds
    }
}

/// Compose `scheme://[user[:password]@]host:port[/database]`.
///
/// User, password and database are percent-encoded. An empty user drops
/// the whole userinfo (anonymous plans); an empty password drops only the
/// `:password` part. IPv6 hosts are bracketed.
pub fn build_uri(
    scheme: &str,
    host: &str,
    port: u16,
    user: &str,
    password: &str,
    database: &str,
) -> String {
    let mut uri = format!("{}://", scheme);

    if !user.is_empty() {
        uri.push_str(&utf8_percent_encode(user, UNRESERVED).to_string());
        if !password.is_empty() {
            uri.push(':');
            uri.push_str(&utf8_percent_encode(password, UNRESERVED).to_string());
        }
        uri.push('@');
    }

    if host.contains(':') && !host.starts_with('[') {
        uri.push_str(&format!("[{}]", host));
    } else {
        uri.push_str(host);
    }
    uri.push_str(&format!(":{}", port));

    if !database.is_empty() {
        uri.push('/');
        uri.push_str(&utf8_percent_encode(database, UNRESERVED).to_string());
    }

    uri
}

#[cfg(test)]
mod tests {
    use super::*;
    use percent_encoding::percent_decode_str;
    use url::Url;

    #[test]
    fn test_anonymous_uri() {
        assert_eq!(
            build_uri("redis", "10.96.0.12", 11211, "", "", ""),
            "redis://10.96.0.12:11211"
        );
    }

    #[test]
    fn test_full_uri() {
        assert_eq!(
            build_uri("mysql", "db.ns.svc", 3306, "root", "pw", "shop"),
            "mysql://root:pw@db.ns.svc:3306/shop"
        );
    }

    #[test]
    fn test_user_without_password() {
        assert_eq!(
            build_uri("postgresql", "pg", 5432, "app", "", ""),
            "postgresql://app@pg:5432"
        );
    }

    #[test]
    fn test_ipv6_host_is_bracketed() {
        assert_eq!(
            build_uri("redis", "fd00::12", 6379, "", "", ""),
            "redis://[fd00::12]:6379"
        );
    }

    #[test]
    fn test_uri_round_trips_components() {
        let cases = [
            ("mysql", "10.0.0.7", 3306, "app", "p@ss:w/rd?#", "orders"),
            ("postgresql", "pg.example.com", 5432, "postgres", "s3cr3t", "my db"),
            ("mongodb", "fd00::1", 27017, "root", "Zx%9&=", ""),
        ];

        for (scheme, host, port, user, password, database) in cases {
            let uri = build_uri(scheme, host, port, user, password, database);
            let parsed = Url::parse(&uri).unwrap_or_else(|e| panic!("{}: {}", uri, e));

            assert_eq!(parsed.scheme(), scheme);
            let parsed_host = parsed.host_str().unwrap().trim_matches(|c| c == '[' || c == ']');
            assert_eq!(parsed_host, host);
            assert_eq!(parsed.port(), Some(port));
            assert_eq!(
                percent_decode_str(parsed.username()).decode_utf8().unwrap(),
                user
            );
            assert_eq!(
                percent_decode_str(parsed.password().unwrap_or(""))
                    .decode_utf8()
                    .unwrap(),
                password
            );
            assert_eq!(
                percent_decode_str(parsed.path().trim_start_matches('/'))
                    .decode_utf8()
                    .unwrap(),
                database
            );
        }
    }

    #[test]
    fn test_credentials_compose_uri() {
        let creds = Credentials::new("redis", "10.96.0.12", 11211, "", "", "");
        assert_eq!(creds.uri, "redis://10.96.0.12:11211");
        assert_eq!(creds.port, 11211);
    }
}
