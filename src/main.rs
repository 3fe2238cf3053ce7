use clap::Parser;
use time_metrics::{
    app::App,
    auth::tokens::TokenEntry,
    init::{
        settings::{Mode, Overrides, Settings},
        setup::{setup, setup_tracing},
    },
};
use tracing::{error, info};

/// Time metrics API
#[derive(Parser)]
#[command(version, about, long_about = None)]
struct Args {
    /// Server address
    #[arg(short, long, env = "METRICS_API_ADDRESS")]
    address: Option<String>,
    /// Listening port
    #[arg(short, long, env = "METRICS_API_PORT")]
    port: Option<u16>,
    /// Serve /metrics openly or behind a bearer token
    #[arg(short, long, value_enum, env = "METRICS_API_MODE")]
    mode: Option<Mode>,
    /// Config file path
    #[arg(short, long, env = "METRICS_API_CONFIG")]
    config_file: Option<String>,
    /// HTTPS enable
    #[arg(long, env = "METRICS_API_ENABLE_HTTPS")]
    enable_https: bool,
    /// Certificate directory (server.crt, server.key)
    #[arg(long, env = "METRICS_API_CERTS_DIR")]
    certs_dir: Option<String>,
    /// Log level or filter directives, RUST_LOG wins if set
    #[arg(short, long, env = "METRICS_API_LOG_LEVEL")]
    log_level: Option<String>,
    /// Accepted bearer token as TOKEN=USER, may be repeated
    #[arg(
        short,
        long = "token",
        env = "METRICS_API_TOKENS",
        value_delimiter = ',',
        value_parser = parse_token_entry,
        hide_env_values = true
    )]
    tokens: Vec<TokenEntry>,
}

fn parse_token_entry(s: &str) -> Result<TokenEntry, String> {
    s.parse().map_err(|e: time_metrics::err::Error| e.to_string())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let settings = Settings::new(
        args.config_file,
        Overrides {
            address: args.address,
            port: args.port,
            mode: args.mode,
            enable_https: if args.enable_https { Some(true) } else { None },
            certs_dir: args.certs_dir,
            log_level: args.log_level,
            tokens: args.tokens,
        },
    )?;

    setup_tracing(&settings.log_level);
    settings.print();

    let resources = match setup(&settings).await {
        Ok(resources) => resources,
        Err(e) => {
            error!("Error during setup: {}", e);
            return Err(e.into());
        }
    };

    let server = App::new(resources.shared_state, resources.tls_config);
    if let Err(e) = server.serve(&resources.address, resources.mode).await {
        error!("Error while serving: {}", e);
        return Err(e);
    }

    info!("Server exited");
    Ok(())
}
