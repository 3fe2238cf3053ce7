use crate::{
    auth::tokens::TokenTable,
    clock::SystemClock,
    err::Error,
    init::settings::{Mode, Settings},
    SharedState,
};
use axum_server::tls_rustls::RustlsConfig;
use std::{path::Path, sync::Arc};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

pub struct Resources {
    pub shared_state: SharedState,
    pub tls_config: Option<RustlsConfig>,
    pub address: String,
    pub mode: Mode,
}

/// Install the global tracing subscriber. `RUST_LOG` takes precedence over `level`.
pub fn setup_tracing(level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt().with_env_filter(filter).init();
}

pub async fn setup(settings: &Settings) -> Result<Resources, Error> {
    let tokens = setup_token_table(settings)?;

    let tls_config = if settings.enable_https {
        Some(setup_tls_config(&settings.certs_dir).await?)
    } else {
        None
    };

    info!("Setup complete.");
    Ok(Resources {
        shared_state: SharedState {
            tokens: Arc::new(tokens),
            clock: Arc::new(SystemClock),
        },
        tls_config,
        address: settings.bind_address(),
        mode: settings.mode,
    })
}

pub fn setup_token_table(settings: &Settings) -> Result<TokenTable, Error> {
    let tokens = TokenTable::from_entries(settings.tokens.iter().cloned())?;

    if settings.mode == Mode::Authenticated && tokens.is_empty() {
        warn!("No tokens configured, every /metrics request will be rejected");
    }

    Ok(tokens)
}

pub async fn setup_tls_config(certs_dir_path: &str) -> Result<RustlsConfig, Error> {
    let crt_path = Path::new(certs_dir_path).join("server.crt");
    if !crt_path.try_exists()? {
        return Err(Error::MissingCertificate {
            file: "server.crt",
            dir: certs_dir_path.to_string(),
        });
    }

    let key_path = Path::new(certs_dir_path).join("server.key");
    if !key_path.try_exists()? {
        return Err(Error::MissingCertificate {
            file: "server.key",
            dir: certs_dir_path.to_string(),
        });
    }

    let tls_config = RustlsConfig::from_pem_file(&crt_path, &key_path).await?;
    info!("Loaded TLS certificate from {}", crt_path.display());

    Ok(tls_config)
}
