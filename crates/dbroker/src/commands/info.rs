//! Info command

use anyhow::{bail, Result};
use camino::Utf8Path;

use super::connect;
use crate::cli::InstanceArgs;
use crate::output;

pub async fn run(args: InstanceArgs, config: Option<&Utf8Path>) -> Result<()> {
    let broker = connect(config)?;
    let record = broker
        .lookup(
            &args.service,
            &args.instance_id,
            args.namespace.as_deref(),
        )
        .await?;

    match record {
        Some(record) => output::json(&record),
        None => bail!("instance {} not found", args.instance_id),
    }
}
