//! Bind command

use anyhow::Result;
use camino::Utf8Path;

use super::{connect, read_params};
use crate::cli::BindArgs;
use crate::output;

pub async fn run(args: BindArgs, config: Option<&Utf8Path>) -> Result<()> {
    let broker = connect(config)?;
    let parameters = read_params(args.params.as_deref())?;
    let target = &args.instance;

    let credentials = broker
        .bind(
            &target.service,
            &target.instance_id,
            &parameters,
            target.namespace.as_deref(),
        )
        .await?;

    output::json(&credentials)
}
