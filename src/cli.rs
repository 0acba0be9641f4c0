mod record;

use std::{io::stdout, str::FromStr, time};

use airtable::{AirtableClient, Criteria, Fields, Profile};
use anyhow::bail;
use clap::{Parser, Subcommand};
use serde_json::Value;
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(
    name = "airtable",
    about = "Read and write Airtable records",
    version,
    propagate_version = true
)]
pub(crate) struct Args {
    #[command(flatten)]
    pub global: GlobalArgs,

    #[command(subcommand)]
    pub command: Command,
}

/// How to format output.
#[derive(Default, Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub(crate) enum Output {
    Json,
    #[default]
    Tty,
}

/// field=value pairs. The value is parsed as JSON if possible, and taken as
/// a string otherwise.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct KeyValue(String, Value);

impl FromStr for KeyValue {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let Some((left, right)) = s.split_once('=') else {
            bail!("Invalid field=value pair: {}", s);
        };

        if left.is_empty() {
            bail!("Missing field name in: {}", s);
        }

        let value =
            serde_json::from_str(right).unwrap_or_else(|_| Value::String(right.to_owned()));
        Ok(KeyValue(left.to_owned(), value))
    }
}

pub(crate) fn criteria(pairs: Vec<KeyValue>) -> Criteria {
    pairs.into_iter().map(|KeyValue(k, v)| (k, v)).collect()
}

pub(crate) fn fields(pairs: Vec<KeyValue>) -> Fields {
    pairs.into_iter().map(|KeyValue(k, v)| (k, v)).collect()
}

#[derive(Debug, clap::Args)]
#[command(next_help_heading = "Global Options")]
pub(crate) struct GlobalArgs {
    /// Name of the profile to use
    #[arg(long, short = 'P', global = true)]
    pub profile: Option<String>,
    /// Output format
    #[arg(long, short = 'O', global = true)]
    pub output: Option<Output>,
    /// Timeout (in seconds) for each request (-1 = no timeout)
    #[arg(long, global = true, allow_negative_numbers = true)]
    pub timeout: Option<i64>,
    /// Print verbose logs
    #[arg(long, short = 'v', global = true)]
    pub verbose: bool,
}

#[derive(Debug, Subcommand)]
pub(crate) enum Command {
    /// Print version.
    Version,
    /// Show the base's metadata, collaborators and invite links
    Base,
    /// Get a record by ID
    Get(record::GetArgs),
    /// List records matching some criteria
    #[clap(alias = "ls")]
    Find(record::FindArgs),
    /// Search records for a term
    Search(record::SearchArgs),
    /// Create a record
    Create(record::CreateArgs),
    /// Update some fields of a record
    Update(record::UpdateArgs),
    /// Replace all fields of a record
    Set(record::SetArgs),
    /// Delete records
    #[clap(alias = "delete")]
    Rm(record::RmArgs),
    /// Delete every record in a table
    Flush(record::FlushArgs),
}

pub(crate) struct Cli {
    pub(crate) global: GlobalArgs,
    pub(crate) client: AirtableClient,
}

impl Cli {
    pub(crate) fn output(&self) -> Output {
        self.global.output.unwrap_or_default()
    }
}

pub(crate) fn init_logging(verbose: bool) {
    let default = if verbose {
        "airtable=debug"
    } else {
        "airtable=info"
    };

    let filter =
        EnvFilter::try_from_env("AIRTABLE_LOG").unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

pub(crate) fn run(args: Args) -> anyhow::Result<()> {
    // Some commands don't require any config.
    if let Command::Version = args.command {
        println!("airtable {}", env!("CARGO_PKG_VERSION"));
        return Ok(());
    }

    let profile = if let Some(name) = args.global.profile.as_deref() {
        Profile::from_env(name)
    } else {
        Profile::from_default_env()
    };

    let mut profile = profile?.with_ua_product("airtable-cli");
    match args.global.timeout {
        Some(-1) => profile.timeout = None,
        Some(v) if v > 0 => profile.timeout = Some(time::Duration::from_secs(v as _)),
        Some(v) => bail!("Invalid timeout value: {v}"),
        None => (),
    }

    debug!(?profile, command = ?args.command, "cli invocation");

    let cli = Cli {
        client: AirtableClient::from_profile(profile)?,
        global: args.global,
    };

    match args.command {
        Command::Version => unreachable!(),
        Command::Base => handle_base(&cli),
        Command::Get(args) => record::get(&cli, args),
        Command::Find(args) => record::find(&cli, args),
        Command::Search(args) => record::search(&cli, args),
        Command::Create(args) => record::create(&cli, args),
        Command::Update(args) => record::update(&cli, args),
        Command::Set(args) => record::set(&cli, args),
        Command::Rm(args) => record::rm(&cli, args),
        Command::Flush(args) => record::flush(&cli, args),
    }
}

fn handle_base(cli: &Cli) -> anyhow::Result<()> {
    let base = cli.client.get_base()?;
    match cli.output() {
        Output::Json => serde_json::to_writer(stdout(), &base)?,
        Output::Tty => serde_json::to_writer_pretty(stdout(), &base)?,
    }

    println!();
    Ok(())
}
