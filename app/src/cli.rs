use std::path::PathBuf;

use clap::Parser;
use qgrid_core::profiles::{ConnectionProfile, PasswordSource, TlsMode};

#[derive(Debug, Parser)]
#[command(
    name = "qgrid",
    version,
    about = "Run a SQL query and browse, sort, copy and edit the result in a terminal grid"
)]
pub struct Cli {
    #[arg(long, default_value = "127.0.0.1", help = "Database host")]
    pub host: String,
    #[arg(long, default_value_t = 3306, help = "Database port")]
    pub port: u16,
    #[arg(short, long, default_value = "root", help = "Database user")]
    pub user: String,
    #[arg(short, long, help = "Default database (schema)")]
    pub database: Option<String>,
    #[arg(
        long,
        default_value = "prefer",
        help = "TLS mode: disabled, prefer, require or verify-identity"
    )]
    pub tls: TlsMode,
    #[arg(long, help = "CA certificate for TLS verification")]
    pub tls_ca_cert: Option<PathBuf>,
    #[arg(
        long,
        default_value = "env",
        help = "Where the password comes from: env (QGRID_DB_PASSWORD) or keyring"
    )]
    pub password_source: PasswordSource,
    #[arg(long, help = "Row limit appended to result-producing queries (0 disables)")]
    pub limit: Option<usize>,
    #[arg(long, help = "Table that row edits target, instead of detecting it")]
    pub table: Option<String>,
    #[arg(
        long = "param",
        value_name = "NAME=VALUE",
        value_parser = parse_param,
        help = "Value for a :name parameter; repeatable"
    )]
    pub params: Vec<(String, String)>,
    #[arg(long, help = "Directory holding settings.toml and logs")]
    pub config_dir: Option<PathBuf>,
    #[arg(help = "SQL to run")]
    pub sql: String,
}

impl Cli {
    #[must_use]
    pub fn profile(&self) -> ConnectionProfile {
        let mut profile = ConnectionProfile::new("cli", self.host.clone(), self.user.clone());
        profile.port = self.port;
        profile.database.clone_from(&self.database);
        profile.tls_mode = self.tls;
        profile.tls_ca_cert_path = self
            .tls_ca_cert
            .as_ref()
            .map(|path| path.to_string_lossy().into_owned());
        profile.password_source = self.password_source;
        profile
    }
}

fn parse_param(raw: &str) -> Result<(String, String), String> {
    match raw.split_once('=') {
        Some((name, value)) if !name.trim().is_empty() => {
            Ok((name.trim().to_string(), value.to_string()))
        }
        _ => Err(format!("expected NAME=VALUE, got `{raw}`")),
    }
}
