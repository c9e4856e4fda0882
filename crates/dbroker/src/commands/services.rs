//! Services command
//!
//! Lists the catalog from configuration alone; no API server is contacted.

use anyhow::Result;
use camino::Utf8Path;
use dbroker_providers::service_catalog;
use serde::Serialize;

use super::load_config;
use crate::cli::ServicesArgs;
use crate::output;

#[derive(Debug, Serialize)]
struct ServiceEntry<'a> {
    id: &'a str,
    kind: &'static str,
    plans: &'static [&'static str],
}

pub fn run(args: ServicesArgs, config: Option<&Utf8Path>) -> Result<()> {
    let config = load_config(config)?;

    let mut entries = Vec::new();
    for id in &config.services {
        if args.service.as_ref().is_some_and(|s| s != id) {
            continue;
        }
        let (kind, plans) = service_catalog(id)?;
        entries.push(ServiceEntry {
            id,
            kind: kind.kind_name(),
            plans,
        });
    }

    output::json(&entries)
}
