//! CLI argument parsing with clap

use camino::Utf8PathBuf;
use clap::{Args, Parser, Subcommand};

/// dbroker - provision and bind operator-managed databases
#[derive(Parser, Debug)]
#[command(name = "dbroker")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Increase verbosity (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Only log errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Path to dbroker.yaml config file
    #[arg(short, long, global = true)]
    pub config: Option<Utf8PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Provision a new instance and wait until it is running
    Provision(ProvisionArgs),

    /// Remove an instance and its retained data
    Deprovision(InstanceArgs),

    /// Issue connection credentials for an instance
    Bind(BindArgs),

    /// Release a binding
    Unbind(InstanceArgs),

    /// Show the provisioning record of an instance
    Info(InstanceArgs),

    /// List enabled services and their plans
    Services(ServicesArgs),
}

/// Service and instance selection shared by every instance command
#[derive(Args, Debug)]
pub struct InstanceArgs {
    /// Service id (mysql, postgresql, mongodb, elasticsearch, redis, memcached)
    #[arg(short, long)]
    pub service: String,

    /// Instance id
    #[arg(short, long = "instance-id")]
    pub instance_id: String,

    /// Namespace to search (defaults to every namespace)
    #[arg(short, long)]
    pub namespace: Option<String>,
}

// Provision command
#[derive(Args, Debug)]
pub struct ProvisionArgs {
    #[command(flatten)]
    pub instance: InstanceArgs,

    /// Plan id
    #[arg(short, long)]
    pub plan: String,

    /// Parameters as a JSON object, or @path to read them from a file
    #[arg(long)]
    pub params: Option<String>,
}

// Bind command
#[derive(Args, Debug)]
pub struct BindArgs {
    #[command(flatten)]
    pub instance: InstanceArgs,

    /// Bind parameters as a JSON object, or @path to read them from a file
    #[arg(long)]
    pub params: Option<String>,
}

// Services command
#[derive(Args, Debug)]
pub struct ServicesArgs {
    /// Only list this service
    #[arg(short, long)]
    pub service: Option<String>,
}
