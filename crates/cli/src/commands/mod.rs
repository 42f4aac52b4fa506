//! CLI command definitions and execution
//!
//! Every command loads the configuration once, builds at most one S3 client
//! and maps any failure to an exit code.

use clap::{Parser, Subcommand};
use s3t_core::{Config, ConfigManager, Error, RemotePath, parse_remote};
use s3t_s3::{MultipartConfig, S3Client};

use crate::exit_code::ExitCode;
use crate::output::{Formatter, OutputConfig};

mod cp;
mod get;
mod info;
mod ls;
mod mp;
mod put;
mod rm;
mod setacl;
mod sync;

/// s3t - sync local directory trees with S3
///
/// Credentials come from the standard AWS chain. Set AWS_ENDPOINT to use an
/// S3-compatible server.
#[derive(Parser, Debug)]
#[command(name = "s3t")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Output format: human-readable or JSON
    #[arg(long, global = true, default_value = "false")]
    pub json: bool,

    /// Disable colored output
    #[arg(long, global = true, default_value = "false")]
    pub no_color: bool,

    /// Disable progress bar
    #[arg(long, global = true, default_value = "false")]
    pub no_progress: bool,

    /// Suppress non-error output
    #[arg(short, long, global = true, default_value = "false")]
    pub quiet: bool,

    /// Enable debug logging
    #[arg(long, global = true, default_value = "false")]
    pub debug: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List buckets, or objects under a prefix
    Ls(ls::LsArgs),

    /// Download one object
    Get(get::GetArgs),

    /// Upload one file
    Put(put::PutArgs),

    /// Remove one object
    Rm(rm::RmArgs),

    /// Copy an object within a bucket
    Cp(cp::CpArgs),

    /// Show object metadata and ACL
    Info(info::InfoArgs),

    /// Set an object's canned ACL
    Setacl(setacl::SetaclArgs),

    /// Sync a local directory tree to S3 or back
    Sync(sync::SyncArgs),

    /// Inspect and abort incomplete multipart uploads
    #[command(subcommand)]
    Mp(mp::MpCommands),
}

/// State shared by every command of one run
pub struct Context {
    pub config: Config,
    pub formatter: Formatter,
}

impl Context {
    /// Build the S3 client for this run
    pub async fn connect(&self) -> s3t_core::Result<S3Client> {
        let settings = self.config.store.clone().from_env()?;
        S3Client::new(&settings, MultipartConfig::from_settings(&self.config.transfer)).await
    }

    /// Report `err` and pick the exit code for it
    pub fn fail(&self, err: &Error) -> ExitCode {
        self.formatter.error(&err.to_string());
        ExitCode::from_error(err)
    }
}

/// Parse an argument that must name an object, not just a bucket
pub(crate) fn parse_object(arg: &str) -> s3t_core::Result<RemotePath> {
    let path = parse_remote(arg)?;
    if path.key.is_empty() || path.is_dir {
        return Err(Error::InvalidPath(format!("{arg} does not name an object")));
    }
    Ok(path)
}

/// Execute the CLI command and return an exit code
pub async fn execute(cli: Cli) -> ExitCode {
    let flags = OutputConfig {
        json: cli.json,
        no_color: cli.no_color,
        no_progress: cli.no_progress,
        quiet: cli.quiet,
    };

    let config = match ConfigManager::new().and_then(|manager| manager.load()) {
        Ok(config) => config,
        Err(e) => {
            let formatter = Formatter::new(flags);
            formatter.error(&format!("Failed to load configuration: {e}"));
            return ExitCode::from_error(&e);
        }
    };

    let ctx = Context {
        formatter: Formatter::new(flags.with_defaults(&config.defaults)),
        config,
    };

    match cli.command {
        Commands::Ls(args) => ls::execute(args, &ctx).await,
        Commands::Get(args) => get::execute(args, &ctx).await,
        Commands::Put(args) => put::execute(args, &ctx).await,
        Commands::Rm(args) => rm::execute(args, &ctx).await,
        Commands::Cp(args) => cp::execute(args, &ctx).await,
        Commands::Info(args) => info::execute(args, &ctx).await,
        Commands::Setacl(args) => setacl::execute(args, &ctx).await,
        Commands::Sync(args) => sync::execute(args, &ctx).await,
        Commands::Mp(cmd) => mp::execute(cmd, &ctx).await,
    }
}
