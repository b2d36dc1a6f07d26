//! Clap derive structures for the `icr` CLI.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

// ── Top-Level CLI ────────────────────────────────────────────────────

/// icr -- send iControl REST requests to a BIG-IP
#[derive(Debug, Parser)]
#[command(
    name = "icr",
    version,
    about = "Send iControl REST requests to a BIG-IP from the command line",
    long_about = "Issues GET/POST/PUT/PATCH/DELETE requests against a BIG-IP \
        iControl REST endpoint using basic or token authentication.\n\n\
        Resources can be addressed by literal URL, or by collection plus \
        --name/--partition (e.g. /mgmt/tm/ltm/nat/ --name foo).",
    propagate_version = true,
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOpts,

    #[command(subcommand)]
    pub command: Command,
}

// ── Global Options ───────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct GlobalOpts {
    /// Device profile to use
    #[arg(long, short = 'p', env = "ICONTROL_PROFILE", global = true)]
    pub profile: Option<String>,

    /// Device host or base URL (overrides profile)
    #[arg(long, short = 'H', env = "ICONTROL_HOST", global = true)]
    pub host: Option<String>,

    /// Account name (overrides profile)
    #[arg(long, short = 'u', env = "ICONTROL_USERNAME", global = true)]
    pub username: Option<String>,

    /// Account password (overrides profile)
    #[arg(long, env = "ICONTROL_PASSWORD", global = true, hide_env_values = true)]
    pub password: Option<String>,

    /// Authentication mode (overrides profile)
    #[arg(long, value_enum, global = true)]
    pub auth: Option<AuthMode>,

    /// loginProviderName sent with token requests
    #[arg(long, global = true)]
    pub login_provider: Option<String>,

    /// Default partition for --name addressing
    #[arg(long, global = true)]
    pub default_partition: Option<String>,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Print compact single-line JSON
    #[arg(long, global = true)]
    pub compact: bool,

    /// Accept self-signed TLS certificates
    #[arg(long, short = 'k', env = "ICONTROL_INSECURE", global = true)]
    pub insecure: bool,

    /// Request timeout in seconds
    #[arg(long, env = "ICONTROL_TIMEOUT", global = true)]
    pub timeout: Option<u64>,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum AuthMode {
    /// HTTP basic credentials on every request
    Basic,
    /// Fetch and cache an X-F5-Auth-Token
    Token,
}

impl From<AuthMode> for icontrol::AuthStrategy {
    fn from(mode: AuthMode) -> Self {
        match mode {
            AuthMode::Basic => Self::Basic,
            AuthMode::Token => Self::Token,
        }
    }
}

// ── Commands ─────────────────────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Fetch a resource or collection
    Get(RequestArgs),

    /// Create a resource in a collection
    Post(BodyArgs),

    /// Replace a resource
    Put(BodyArgs),

    /// Update selected fields of a resource
    Patch(BodyArgs),

    /// Delete a resource
    #[command(alias = "rm")]
    Delete(RequestArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

#[derive(Debug, Args)]
pub struct RequestArgs {
    /// Literal URL or path, or the collection when --name is given
    pub target: String,

    #[command(flatten)]
    pub parts: PartsArgs,

    /// Query parameter as key=value (repeatable)
    #[arg(long = "param", value_parser = parse_key_val)]
    pub params: Vec<(String, String)>,
}

#[derive(Debug, Args)]
pub struct PartsArgs {
    /// Resource name; switches to structured addressing
    #[arg(long)]
    pub name: Option<String>,

    /// Partition (requires --name)
    #[arg(long, requires = "name")]
    pub partition: Option<String>,

    /// Folder between partition and name (requires --name)
    #[arg(long, requires = "name")]
    pub sub_path: Option<String>,

    /// Trailing path after the name, e.g. /members (requires --name)
    #[arg(long, requires = "name")]
    pub suffix: Option<String>,
}

#[derive(Debug, Args)]
pub struct BodyArgs {
    #[command(flatten)]
    pub request: RequestArgs,

    /// JSON body
    #[arg(long, short = 'd', conflicts_with = "data_file")]
    pub data: Option<String>,

    /// Read the JSON body from a file
    #[arg(long, short = 'f')]
    pub data_file: Option<PathBuf>,
}

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: clap_complete::Shell,
}

fn parse_key_val(s: &str) -> Result<(String, String), String> {
    let (key, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected key=value, got '{s}'"))?;
    Ok((key.to_owned(), value.to_owned()))
}
