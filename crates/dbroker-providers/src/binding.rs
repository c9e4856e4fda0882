//! Credential resolution shared by the bind implementations

use dbroker_core::params::{optional_str, Parameters};
use dbroker_core::types::{SecretData, Service};
use dbroker_core::{Credentials, Error, Result};

/// Bind option keys and secret defaults of a backend with a generated login
#[derive(Debug, Clone, Copy)]
pub struct LoginKeys {
    /// Bind option naming a non-default user
    pub user_option: &'static str,
    /// User when the option is absent
    pub default_user: &'static str,
    /// Secret key holding the named user's password
    pub password_option: &'static str,
    /// Secret key holding the default user's password
    pub default_password_key: &'static str,
}

/// Port named `name`, falling back to the first port
pub fn select_port(service: &Service, name: &str) -> Result<u16> {
    let ports = &service.spec.ports;
    let port = ports
        .iter()
        .find(|p| p.name == name)
        .or_else(|| ports.first())
        .ok_or_else(|| Error::NoPortsFound {
            service: service.name().to_string(),
        })?;
    Ok(port.port)
}

/// User and password for the bind request.
///
/// A user named in the bind options must have its password under the
/// password option key; otherwise the default user's password is read from
/// the default key.
pub fn resolve_login(
    params: &Parameters,
    secret: &SecretData,
    keys: &LoginKeys,
) -> Result<(String, String)> {
    let (user, password_key) = match optional_str(params, keys.user_option)? {
        Some(user) => (user, keys.password_option),
        None => (keys.default_user, keys.default_password_key),
    };
    let password = secret
        .get(password_key)
        .ok_or_else(|| Error::missing_secret_key(password_key))?;
    Ok((user.to_string(), password.clone()))
}

/// Database named by an optional bind option, empty when absent
pub fn optional_database(params: &Parameters, key: &str) -> Result<String> {
    Ok(optional_str(params, key)?.unwrap_or_default().to_string())
}

/// Credentials for a backend that generates a login secret
pub fn login_credentials(
    service: &Service,
    params: &Parameters,
    secret: &SecretData,
    scheme: &str,
    port_name: &str,
    keys: &LoginKeys,
    database_option: &str,
) -> Result<Credentials> {
    let port = select_port(service, port_name)?;
    let host = service.reachable_host();
    let database = optional_database(params, database_option)?;
    let (user, password) = resolve_login(params, secret, keys)?;
    Ok(Credentials::new(scheme, host, port, user, password, database))
}

/// Credentials for a backend without authentication
pub fn anonymous_credentials(
    service: &Service,
    params: &Parameters,
    scheme: &str,
    port_name: &str,
    database_option: Option<&str>,
) -> Result<Credentials> {
    let port = select_port(service, port_name)?;
    let host = service.reachable_host();
    let database = match database_option {
        Some(key) => optional_database(params, key)?,
        None => String::new(),
    };
    Ok(Credentials::new(scheme, host, port, "", "", database))
}
