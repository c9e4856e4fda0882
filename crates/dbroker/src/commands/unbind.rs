//! Unbind command

use anyhow::Result;
use camino::Utf8Path;

use super::connect;
use crate::cli::InstanceArgs;
use crate::output;

pub async fn run(args: InstanceArgs, config: Option<&Utf8Path>) -> Result<()> {
    let broker = connect(config)?;
    broker
        .unbind(
            &args.service,
            &args.instance_id,
            args.namespace.as_deref(),
        )
        .await?;

    output::status(&format!("binding for {} released", args.instance_id))
}
