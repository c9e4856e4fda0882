//! Bind behaviour across every provider
//!
//! Bind is pure: it only reads the service, the merged parameters and the
//! decoded secret it is handed. These tests never touch the fake client.

mod common;

use common::*;
use dbroker_core::params::Parameters;
use dbroker_core::types::{SecretData, Service};
use dbroker_core::Error;
use dbroker_providers::{create_provider, Provider, ProviderContext};
use percent_encoding::percent_decode_str;
use serde_json::json;
use std::sync::Arc;
use url::Url;

fn provider(service_id: &str) -> Box<dyn Provider> {
    let ctx = ProviderContext::new(Arc::new(FakeResourceClient::new()));
    create_provider(service_id, ctx).unwrap()
}

fn secret(pairs: &[(&str, &str)]) -> SecretData {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

fn decoded(part: &str) -> String {
    percent_decode_str(part).decode_utf8().unwrap().into_owned()
}

const ALL_SERVICES: &[&str] = &[
    "mysql",
    "postgresql",
    "mongodb",
    "elasticsearch",
    "redis",
    "memcached",
];

// ═══════════════════════════════════════════════════════════════════════════════
// Ports
// ═══════════════════════════════════════════════════════════════════════════════

#[test]
fn test_zero_ports_is_an_error_for_every_backend() {
    let service = Service::new("empty", "ns").with_cluster_ip("10.0.0.1");
    let full = secret(&[
        ("password", "pw"),
        ("POSTGRES_PASSWORD", "pw"),
        ("ADMIN_PASSWORD", "pw"),
    ]);

    for id in ALL_SERVICES {
        let result = provider(id).bind(&service, &Parameters::new(), &full);
        assert!(
            matches!(result, Err(Error::NoPortsFound { ref service }) if service == "empty"),
            "{} returned {:?}",
            id,
            result
        );
    }
}

#[test]
fn test_named_port_is_preferred_over_first_port() {
    let service = Service::new("pg", "ns")
        .with_cluster_ip("10.0.0.2")
        .with_port("metrics", 9187)
        .with_port("postgres", 5432);
    let creds = provider("postgresql")
        .bind(
            &service,
            &Parameters::new(),
            &secret(&[("POSTGRES_PASSWORD", "pw")]),
        )
        .unwrap();
    assert_eq!(creds.port, 5432);
}

// ═══════════════════════════════════════════════════════════════════════════════
// Purity
// ═══════════════════════════════════════════════════════════════════════════════

#[test]
fn test_bind_is_deterministic() {
    let service = Service::new("svc", "ns")
        .with_cluster_ip("10.0.0.3")
        .with_port("db", 9200)
        .with_port("mysql", 3306)
        .with_port("postgres", 5432)
        .with_port("mongodb", 27017);
    let data = secret(&[
        ("password", "p@ss/word"),
        ("POSTGRES_PASSWORD", "pg"),
        ("ADMIN_PASSWORD", "es"),
    ]);
    let bind_params = params(json!({"mysqlDatabase": "app", "rdDatabase": "0"}));

    for id in ALL_SERVICES {
        let p = provider(id);
        let first = p.bind(&service, &bind_params, &data).unwrap();
        let second = p.bind(&service, &bind_params, &data).unwrap();
        assert_eq!(first, second, "{} is not deterministic", id);
        assert_eq!(
            serde_json::to_vec(&first).unwrap(),
            serde_json::to_vec(&second).unwrap()
        );
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Credential resolution
// ═══════════════════════════════════════════════════════════════════════════════

#[test]
fn test_default_credentials_per_backend() {
    let cases = [
        ("mysql", "mysql", 3306, "mysql", "root", "password"),
        ("postgresql", "postgres", 5432, "postgresql", "postgres", "POSTGRES_PASSWORD"),
        ("mongodb", "mongodb", 27017, "mongodb", "root", "password"),
        ("elasticsearch", "db", 9200, "http", "admin", "ADMIN_PASSWORD"),
    ];

    for (id, port_name, port, scheme, user, key) in cases {
        let service = Service::new("db", "ns")
            .with_cluster_ip("10.1.2.3")
            .with_port(port_name, port);
        let creds = provider(id)
            .bind(&service, &Parameters::new(), &secret(&[(key, "s3cret")]))
            .unwrap();

        assert_eq!(creds.protocol, scheme, "{}", id);
        assert_eq!(creds.username, user, "{}", id);
        assert_eq!(creds.password, "s3cret", "{}", id);
        assert_eq!(
            creds.uri,
            format!("{}://{}:s3cret@10.1.2.3:{}", scheme, user, port),
            "{}",
            id
        );
    }
}

#[test]
fn test_named_user_without_password_key() {
    let service = Service::new("my", "ns")
        .with_cluster_ip("10.0.0.4")
        .with_port("mysql", 3306);
    let err = provider("mysql")
        .bind(
            &service,
            &params(json!({"mysqlUser": "app"})),
            &secret(&[("password", "root-pw")]),
        )
        .unwrap_err();

    match err {
        Error::MissingSecretKey { key } => assert_eq!(key, "mysqlPassword"),
        other => panic!("expected MissingSecretKey, got {:?}", other),
    }
}

#[test]
fn test_missing_default_key_names_it() {
    let service = Service::new("es", "ns").with_port("db", 9200);
    let err = provider("elasticsearch")
        .bind(&service, &Parameters::new(), &SecretData::new())
        .unwrap_err();
    assert!(matches!(err, Error::MissingSecretKey { key } if key == "ADMIN_PASSWORD"));
}

#[test]
fn test_option_with_wrong_type() {
    let service = Service::new("mongo", "ns").with_port("mongodb", 27017);
    let err = provider("mongodb")
        .bind(
            &service,
            &params(json!({"mongodbDatabase": ["a", "b"]})),
            &secret(&[("password", "pw")]),
        )
        .unwrap_err();
    assert!(matches!(err, Error::InvalidParameter { key, .. } if key == "mongodbDatabase"));
}

#[test]
fn test_redis_backed_cache_binds_with_redis_scheme() {
    let service = Service::new("redis-abc", "svc-test")
        .with_cluster_ip("10.96.4.20")
        .with_port("db", 11211);
    let creds = provider("redis")
        .bind(&service, &Parameters::new(), &SecretData::new())
        .unwrap();

    assert_eq!(creds.protocol, "redis");
    assert_eq!(creds.port, 11211);
    assert_eq!(creds.host, "10.96.4.20");
    assert_eq!(creds.username, "");
    assert_eq!(creds.password, "");
    assert_eq!(creds.database, "");
    assert_eq!(creds.uri, "redis://10.96.4.20:11211");
}

#[test]
fn test_memcached_binds_with_memcached_scheme() {
    let service = Service::new("mc", "ns")
        .with_cluster_ip("10.0.0.9")
        .with_port("db", 11211);
    let creds = provider("memcached")
        .bind(
            &service,
            &params(json!({"rdDatabase": "ignored"})),
            &SecretData::new(),
        )
        .unwrap();
    assert_eq!(creds.uri, "memcached://10.0.0.9:11211");
}

#[test]
fn test_headless_service_falls_back_to_dns_name() {
    let service = Service::new("rd", "cache")
        .with_cluster_ip("None")
        .with_port("db", 6379);
    let creds = provider("redis")
        .bind(
            &service,
            &params(json!({"rdDatabase": "2"})),
            &SecretData::new(),
        )
        .unwrap();
    assert_eq!(creds.uri, "redis://rd.cache.svc:6379/2");
}

// ═══════════════════════════════════════════════════════════════════════════════
// URI round trip
// ═══════════════════════════════════════════════════════════════════════════════

#[test]
fn test_uri_round_trips_components() {
    let service = Service::new("my", "ns")
        .with_cluster_ip("10.20.30.40")
        .with_port("mysql", 3306);
    let bind_params = params(json!({"mysqlUser": "app user", "mysqlDatabase": "orders/2024"}));
    let data = secret(&[("mysqlPassword", "p@ss:w/rd?#%")]);

    let creds = provider("mysql").bind(&service, &bind_params, &data).unwrap();
    let url = Url::parse(&creds.uri).unwrap();

    assert_eq!(url.scheme(), "mysql");
    assert_eq!(url.host_str(), Some("10.20.30.40"));
    assert_eq!(url.port(), Some(3306));
    assert_eq!(decoded(url.username()), "app user");
    assert_eq!(decoded(url.password().unwrap()), "p@ss:w/rd?#%");
    assert_eq!(decoded(url.path().trim_start_matches('/')), "orders/2024");
}

#[test]
fn test_ipv6_host_is_bracketed() {
    let mut service = Service::new("pg", "ns").with_port("postgres", 5432);
    service.spec.external_ips = vec!["fd00::1".to_string()];

    let creds = provider("postgresql")
        .bind(
            &service,
            &Parameters::new(),
            &secret(&[("POSTGRES_PASSWORD", "pw")]),
        )
        .unwrap();
    let url = Url::parse(&creds.uri).unwrap();

    assert_eq!(creds.host, "fd00::1");
    assert_eq!(url.host_str(), Some("[fd00::1]"));
    assert_eq!(url.port(), Some(5432));
}
