use crate::auth::tokens::TokenEntry;
use config::{Config, ConfigError, File, Source};
use std::{fmt, str::FromStr};
use tracing::info;

/// Which version of the service to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum Mode {
    /// `/metrics` answers anyone
    Open,
    /// `/metrics` requires a bearer token
    Authenticated,
}

impl Mode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Mode::Open => "open",
            Mode::Authenticated => "authenticated",
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Mode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "open" => Ok(Mode::Open),
            "authenticated" => Ok(Mode::Authenticated),
            other => Err(ConfigError::Message(format!(
                "invalid mode `{}`, expected `open` or `authenticated`",
                other
            ))),
        }
    }
}

/// Values given on the command line or through the environment.
/// They take precedence over the config file.
#[derive(Default)]
pub struct Overrides {
    pub address: Option<String>,
    pub port: Option<u16>,
    pub mode: Option<Mode>,
    pub enable_https: Option<bool>,
    pub certs_dir: Option<String>,
    pub log_level: Option<String>,
    pub tokens: Vec<TokenEntry>,
}

pub struct Settings {
    pub address: String,
    pub port: u16,
    pub mode: Mode,
    pub enable_https: bool,
    pub certs_dir: String,
    pub log_level: String,
    pub tokens: Vec<TokenEntry>,
}

impl Settings {
    /// Load settings from `config_file` (or an optional `config.*` in the
    /// working directory) and apply `overrides` on top.
    pub fn new(config_file: Option<String>, overrides: Overrides) -> Result<Self, ConfigError> {
        let file = match config_file {
            Some(path) => File::with_name(&path).required(true),
            None => File::with_name("config").required(false),
        };

        Self::load(file, overrides)
    }

    pub fn load<S>(source: S, overrides: Overrides) -> Result<Self, ConfigError>
    where
        S: Source + Send + Sync + 'static,
    {
        let builder = Config::builder()
            .set_default("address", "0.0.0.0")?
            .set_default("port", 8000)?
            .set_default("mode", Mode::Authenticated.as_str())?
            .set_default("enable_https", false)?
            .set_default("certs_dir", "certs")?
            .set_default("log_level", "info")?
            .set_default("tokens", Vec::<String>::new())?
            .add_source(source)
            .set_override_option("address", overrides.address)?
            .set_override_option("port", overrides.port)?
            .set_override_option("mode", overrides.mode.map(|m| m.as_str()))?
            .set_override_option("enable_https", overrides.enable_https)?
            .set_override_option("certs_dir", overrides.certs_dir)?
            .set_override_option("log_level", overrides.log_level)?;

        let config = builder.build()?;

        // Command line tokens come last so they replace file entries with the same token
        let mut tokens: Vec<TokenEntry> = config.get("tokens")?;
        tokens.extend(overrides.tokens);

        Ok(Settings {
            address: config.get("address")?,
            port: config.get("port")?,
            mode: config.get_string("mode")?.parse()?,
            enable_https: config.get("enable_https")?,
            certs_dir: config.get("certs_dir")?,
            log_level: config.get("log_level")?,
            tokens,
        })
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.address, self.port)
    }

    pub fn print(&self) {
        info!("Address: {}", self.address);
        info!("Port: {}", self.port);
        info!("Mode: {}", self.mode);
        if self.enable_https {
            info!("HTTPS Enabled");
            info!("Certs Dir: {}", self.certs_dir);
        }
        info!("Log Level: {}", self.log_level);
        info!("Tokens: {} configured", self.tokens.len());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use config::FileFormat;

    fn toml(s: &'static str) -> File<config::FileSourceString, FileFormat> {
        File::from_str(s, FileFormat::Toml)
    }

    #[test]
    fn defaults() {
        let settings = Settings::load(toml(""), Overrides::default()).unwrap();

        assert_eq!(settings.address, "0.0.0.0");
        assert_eq!(settings.port, 8000);
        assert_eq!(settings.mode, Mode::Authenticated);
        assert!(!settings.enable_https);
        assert_eq!(settings.certs_dir, "certs");
        assert_eq!(settings.log_level, "info");
        assert!(settings.tokens.is_empty());
        assert_eq!(settings.bind_address(), "0.0.0.0:8000");
    }

    #[test]
    fn file_values_replace_defaults() {
        let settings = Settings::load(
            toml(
                r#"
                address = "127.0.0.1"
                port = 9100
                mode = "open"

                [[tokens]]
                token = "grafana-token"
                user = "grafana"
                "#,
            ),
            Overrides::default(),
        )
        .unwrap();

        assert_eq!(settings.bind_address(), "127.0.0.1:9100");
        assert_eq!(settings.mode, Mode::Open);
        assert_eq!(
            settings.tokens,
            vec![TokenEntry::new("grafana-token", "grafana")]
        );
    }

    #[test]
    fn overrides_replace_file_values() {
        let overrides = Overrides {
            port: Some(9200),
            mode: Some(Mode::Authenticated),
            tokens: vec![TokenEntry::new("grafana-token", "ops")],
            ..Default::default()
        };
        let settings = Settings::load(
            toml(
                r#"
                port = 9100
                mode = "open"

                [[tokens]]
                token = "grafana-token"
                user = "grafana"
                "#,
            ),
            overrides,
        )
        .unwrap();

        assert_eq!(settings.port, 9200);
        assert_eq!(settings.mode, Mode::Authenticated);
        assert_eq!(settings.tokens.last().unwrap().user, "ops");
    }

    #[test]
    fn token_case_is_preserved() {
        let settings = Settings::load(
            toml(
                r#"
                [[tokens]]
                token = "MixedCase-Token"
                user = "Grafana"
                "#,
            ),
            Overrides::default(),
        )
        .unwrap();

        assert_eq!(settings.tokens[0].token, "MixedCase-Token");
        assert_eq!(settings.tokens[0].user, "Grafana");
    }

    #[test]
    fn invalid_mode_is_an_error() {
        let result = Settings::load(toml(r#"mode = "sideways""#), Overrides::default());
        assert!(result.is_err());
    }

    #[test]
    fn mode_parses_case_insensitively() {
        assert_eq!("OPEN".parse::<Mode>().unwrap(), Mode::Open);
        assert_eq!(
            "Authenticated".parse::<Mode>().unwrap(),
            Mode::Authenticated
        );
    }
}
