//! Argument parsing, client wiring, and command dispatch.

use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::Arc;

use clap::{Args, Parser, Subcommand};
use pocli_config::{AuthMethod, ConfigLayer, ConfigSources, resolve};
use tracing::Instrument;
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

use crate::auth::Authenticator;
use crate::client::{AppContext, CliResult};
use crate::commands::policies::{
    handle_activate, handle_create, handle_deactivate, handle_get, handle_list,
};
use crate::commands::schemes::handle_schemes;
use crate::output::Renderer;
use crate::transport::build_service;

const DEFAULT_LOG_FILTER: &str = "warn";

/// Parses CLI arguments, executes the requested command, and reports any
/// failure on stderr. Returns the process exit code.
pub async fn run() -> i32 {
    let cli = Cli::parse();
    init_logging();

    let request_id = Uuid::new_v4().to_string();
    let span = tracing::info_span!(
        "pocli",
        command = cli.command.label(),
        request_id = %request_id
    );

    match execute(cli, &request_id).instrument(span).await {
        Ok(()) => 0,
        Err(err) => {
            eprintln!("error: {}", err.display_message());
            err.exit_code()
        }
    }
}

fn init_logging() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    let installed = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .try_init();
    if let Err(err) = installed {
        eprintln!("warning: failed to install log subscriber: {err}");
    }
}

async fn execute(cli: Cli, request_id: &str) -> CliResult<()> {
    let flags = cli.flag_layer();
    let sources = ConfigSources::from_process(cli.config, flags);
    let config = resolve(&sources)?;

    let authenticator = Authenticator::build(
        config.auth_method,
        &config.credentials,
        &config.ca_certs,
        config.timeout,
    )?;
    let service = build_service(&config, authenticator, request_id)?;
    let ctx = AppContext {
        service: Arc::new(service),
    };

    let stdout = io::stdout();
    let mut out = Renderer::new(stdout.lock());
    dispatch(&ctx, cli.command, &mut out).await
}

pub(crate) async fn dispatch<W: Write>(
    ctx: &AppContext,
    command: Command,
    out: &mut Renderer<W>,
) -> CliResult<()> {
    match command {
        Command::Activate(args) => handle_activate(ctx, args, out).await,
        Command::Create(args) => handle_create(ctx, args, out).await,
        Command::Deactivate(args) => handle_deactivate(ctx, args, out).await,
        Command::Get(args) => handle_get(ctx, args, out).await,
        Command::List(args) => handle_list(ctx, args, out).await,
        Command::Schemes => handle_schemes(ctx, out).await,
    }
}

#[derive(Parser)]
#[command(
    name = "pocli",
    version,
    about = "Policy management client for attestation verification services"
)]
pub(crate) struct Cli {
    #[arg(short = 'c', long, global = true, help = "Configuration file")]
    config: Option<PathBuf>,
    #[arg(
        short = 'H',
        long,
        global = true,
        help = "The host running the management service [default: localhost]"
    )]
    host: Option<String>,
    #[arg(
        short = 'p',
        long,
        global = true,
        help = "The port the management service listens on [default: 10443]"
    )]
    port: Option<u16>,
    #[arg(
        short = 'a',
        long,
        global = true,
        value_parser = parse_auth_method,
        help = "Authentication method: \"none\"/\"passthrough\", \"basic\", or \"oauth2\""
    )]
    auth: Option<AuthMethod>,
    #[arg(short = 'C', long, global = true, help = "OAuth2 client ID")]
    client_id: Option<String>,
    #[arg(short = 'S', long, global = true, help = "OAuth2 client secret")]
    client_secret: Option<String>,
    #[arg(short = 'T', long, global = true, help = "Token URL of the OAuth2 service")]
    token_url: Option<String>,
    #[arg(short = 'U', long, global = true, help = "Service username")]
    username: Option<String>,
    #[arg(short = 'P', long, global = true, help = "Service password")]
    password: Option<String>,
    #[arg(
        short = 'i',
        long,
        global = true,
        num_args = 0..=1,
        require_equals = true,
        default_missing_value = "true",
        help = "Use HTTPS but do not verify the server certificate (implies --tls; development only)"
    )]
    insecure: Option<bool>,
    #[arg(
        short = 's',
        long,
        global = true,
        num_args = 0..=1,
        require_equals = true,
        default_missing_value = "true",
        help = "Use HTTPS; --tls=false overrides the environment and config file"
    )]
    tls: Option<bool>,
    #[arg(
        short = 'E',
        long = "ca-cert",
        global = true,
        help = "CA certificate trusted in addition to system roots; may be repeated"
    )]
    ca_cert: Vec<PathBuf>,
    #[arg(long, global = true, help = "Request timeout in seconds [default: 10]")]
    timeout: Option<u64>,
    #[command(subcommand)]
    pub(crate) command: Command,
}

impl Cli {
    /// Flags as the highest-precedence configuration layer. Absent switches
    /// stay unset so lower sources can supply them; `--tls=false` and
    /// `--insecure=false` override them.
    fn flag_layer(&self) -> ConfigLayer {
        ConfigLayer {
            host: self.host.clone(),
            port: self.port,
            auth: self.auth,
            client_id: self.client_id.clone(),
            client_secret: self.client_secret.clone(),
            token_url: self.token_url.clone(),
            username: self.username.clone(),
            password: self.password.clone(),
            insecure: self.insecure,
            tls: self.tls,
            ca_cert: (!self.ca_cert.is_empty()).then(|| self.ca_cert.clone()),
            timeout: self.timeout,
        }
    }
}

#[derive(Subcommand)]
pub(crate) enum Command {
    /// Activate policy UUID for scheme SCHEME
    Activate(ActivateArgs),
    /// Create a new policy for SCHEME using the rules inside RULES_FILE
    Create(CreateArgs),
    /// Deactivate all policies for scheme SCHEME
    Deactivate(DeactivateArgs),
    /// Get the active policy for SCHEME, or a specific policy when UUID is supplied
    Get(GetArgs),
    /// List policies for SCHEME
    List(ListArgs),
    /// List the attestation schemes supported by the service
    Schemes,
}

impl Command {
    pub(crate) const fn label(&self) -> &'static str {
        match self {
            Self::Activate(_) => "activate",
            Self::Create(_) => "create",
            Self::Deactivate(_) => "deactivate",
            Self::Get(_) => "get",
            Self::List(_) => "list",
            Self::Schemes => "schemes",
        }
    }
}

#[derive(Args)]
pub(crate) struct ActivateArgs {
    #[arg(help = "Scheme name (see `pocli schemes`)")]
    pub(crate) scheme: String,
    #[arg(help = "Unique identifier of the policy to activate")]
    pub(crate) uuid: String,
}

#[derive(Args)]
pub(crate) struct CreateArgs {
    #[arg(help = "Scheme name (see `pocli schemes`)")]
    pub(crate) scheme: String,
    #[arg(help = "Path to the file containing the policy rules")]
    pub(crate) rules_file: PathBuf,
    #[arg(short = 'n', long, help = "The name for the new policy")]
    pub(crate) name: Option<String>,
    #[arg(
        short = 'd',
        long = "dont-activate",
        help = "Do not activate the new policy after creating it"
    )]
    pub(crate) dont_activate: bool,
}

#[derive(Args)]
pub(crate) struct DeactivateArgs {
    #[arg(help = "Scheme name (see `pocli schemes`)")]
    pub(crate) scheme: String,
}

#[derive(Args)]
pub(crate) struct GetArgs {
    #[arg(help = "Scheme name (see `pocli schemes`)")]
    pub(crate) scheme: String,
    #[arg(help = "Unique identifier of the policy; the active policy when omitted")]
    pub(crate) uuid: Option<String>,
    #[arg(
        short = 'o',
        long,
        help = "Write the policy to the specified file rather than stdout"
    )]
    pub(crate) output: Option<PathBuf>,
    #[arg(short = 'w', long, help = "Write the policy's rules to the specified file")]
    pub(crate) write_rules: Option<PathBuf>,
}

#[derive(Args)]
pub(crate) struct ListArgs {
    #[arg(help = "Scheme name (see `pocli schemes`)")]
    pub(crate) scheme: String,
    #[arg(short = 'n', long, help = "Only list policies with the specified name")]
    pub(crate) name: Option<String>,
    #[arg(
        short = 'o',
        long,
        help = "Write the policies to the specified file rather than stdout"
    )]
    pub(crate) output: Option<PathBuf>,
}

fn parse_auth_method(input: &str) -> Result<AuthMethod, String> {
    input.parse().map_err(|err: pocli_config::ParseAuthMethodError| err.to_string())
}
