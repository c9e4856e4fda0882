//! Provision command

use anyhow::Result;
use camino::Utf8Path;
use tracing::info;

use super::{connect, read_params};
use crate::cli::ProvisionArgs;
use crate::output;

pub async fn run(args: ProvisionArgs, config: Option<&Utf8Path>) -> Result<()> {
    let broker = connect(config)?;
    let parameters = read_params(args.params.as_deref())?;
    let target = &args.instance;

    info!(
        "Provisioning {} instance {} on plan {}",
        target.service, target.instance_id, args.plan
    );
    let record = broker
        .provision(
            &target.service,
            &target.instance_id,
            &args.plan,
            parameters,
            target.namespace.as_deref(),
        )
        .await?;

    output::json(&record)
}
