use std::path::PathBuf;

use async_trait::async_trait;
use mysql_async::prelude::{Protocol, Queryable};
use mysql_async::{OptsBuilder, Params, Pool, QueryResult, Row, SslOpts, Value};
use qgrid_core::connection::{ConnectionError, SqlConnection, TableMetadata};
use qgrid_core::dialect::Dialect;
use qgrid_core::profiles::{
    ConnectionProfile, PasswordSource, TlsMode, KEYRING_SERVICE, PASSWORD_ENV,
};
use qgrid_core::result_set::{QueryRow, ResultSet, NULL_DISPLAY};
use tracing::{debug, info, warn};

#[derive(Debug, Clone)]
pub struct MysqlConnection {
    pool: Pool,
    target: String,
}

impl MysqlConnection {
    #[must_use]
    pub fn from_profile(profile: &ConnectionProfile) -> Self {
        Self {
            pool: Pool::new(opts_from_profile(profile)),
            target: profile.display_target(),
        }
    }

    /// Builds the pool and proves it can reach the server.
    pub async fn connect(profile: &ConnectionProfile) -> Result<Self, ConnectionError> {
        let connection = Self::from_profile(profile);
        connection.ping().await?;
        info!(target = %connection.target, "connected");
        Ok(connection)
    }

    pub async fn ping(&self) -> Result<(), ConnectionError> {
        let mut conn = self.pool.get_conn().await.map_err(to_connection_error)?;
        conn.ping().await.map_err(to_connection_error)
    }

    pub async fn disconnect(&self) -> Result<(), ConnectionError> {
        self.pool
            .clone()
            .disconnect()
            .await
            .map_err(to_connection_error)
    }
}

#[async_trait]
impl SqlConnection for MysqlConnection {
    async fn execute_query(
        &self,
        statement: &str,
        args: &[String],
    ) -> Result<ResultSet, ConnectionError> {
        debug!(statement, args = args.len(), "executing query");
        let mut conn = self.pool.get_conn().await.map_err(to_connection_error)?;

        if args.is_empty() {
            let result = conn.query_iter(statement).await.map_err(to_connection_error)?;
            collect_result(result).await
        } else {
            let params =
                Params::Positional(args.iter().map(|arg| Value::from(arg.as_str())).collect());
            let result = conn
                .exec_iter(statement, params)
                .await
                .map_err(to_connection_error)?;
            collect_result(result).await
        }
    }

    async fn execute(&self, statement: &str) -> Result<(), ConnectionError> {
        info!(statement, "executing statement");
        let mut conn = self.pool.get_conn().await.map_err(to_connection_error)?;
        conn.query_drop(statement).await.map_err(to_connection_error)
    }

    async fn table_metadata(&self, table: &str) -> Result<Option<TableMetadata>, ConnectionError> {
        let (schema, table) = split_qualified_table(table);
        let mut conn = self.pool.get_conn().await.map_err(to_connection_error)?;
        let columns = conn
            .exec_map(
                "SELECT COLUMN_NAME, COLUMN_TYPE, COLUMN_KEY \
                 FROM information_schema.COLUMNS \
                 WHERE TABLE_SCHEMA = COALESCE(?, DATABASE()) AND TABLE_NAME = ? \
                 ORDER BY ORDINAL_POSITION",
                (schema, table),
                |(name, data_type, key): (String, String, String)| (name, data_type, key),
            )
            .await
            .map_err(to_connection_error)?;

        Ok(metadata_from_columns(columns))
    }

    fn dialect(&self) -> Dialect {
        Dialect::MySql
    }
}

async fn collect_result<P: Protocol>(
    mut result: QueryResult<'_, 'static, P>,
) -> Result<ResultSet, ConnectionError> {
    let columns = result
        .columns_ref()
        .iter()
        .map(|column| column.name_str().into_owned())
        .collect::<Vec<_>>();
    let rows = result
        .collect::<Row>()
        .await
        .map_err(to_connection_error)?
        .into_iter()
        .map(row_to_query_row)
        .collect();
    Ok(ResultSet::new(columns, rows))
}

fn split_qualified_table(table: &str) -> (Option<String>, String) {
    let unquote = |part: &str| part.trim().trim_matches('`').to_string();
    match table.split_once('.') {
        Some((schema, name)) => (Some(unquote(schema)), unquote(name)),
        None => (None, unquote(table)),
    }
}

fn metadata_from_columns(columns: Vec<(String, String, String)>) -> Option<TableMetadata> {
    if columns.is_empty() {
        return None;
    }
    let mut key_columns = columns
        .iter()
        .filter(|(_, _, key)| key.eq_ignore_ascii_case("PRI"))
        .map(|(name, _, _)| name.clone());
    // A composite key cannot identify a row by one column.
    let primary_key = match (key_columns.next(), key_columns.next()) {
        (Some(name), None) => Some(name),
        _ => None,
    };
    Some(TableMetadata {
        primary_key,
        column_types: columns
            .into_iter()
            .map(|(name, data_type, _)| (name, data_type))
            .collect(),
    })
}

fn opts_from_profile(profile: &ConnectionProfile) -> OptsBuilder {
    let mut builder = OptsBuilder::default()
        .ip_or_hostname(profile.host.clone())
        .tcp_port(profile.port)
        .user(Some(profile.user.clone()));

    if let Some(password) = resolve_password(profile) {
        builder = builder.pass(Some(password));
    }

    if let Some(database) = &profile.database {
        builder = builder.db_name(Some(database.clone()));
    }

    if let Some(ssl_opts) = ssl_opts_from_profile(profile) {
        builder = builder.ssl_opts(ssl_opts);
    }

    if matches!(profile.tls_mode, TlsMode::Disabled) {
        builder = builder.prefer_socket(false);
    }

    builder
}

fn resolve_password(profile: &ConnectionProfile) -> Option<String> {
    let env_password = std::env::var(PASSWORD_ENV)
        .ok()
        .filter(|pw| !pw.is_empty());

    match profile.password_source {
        PasswordSource::EnvVar => env_password,
        PasswordSource::Keyring => {
            if let Some(password) = load_keyring_password(profile) {
                return Some(password);
            }

            if let Some(password) = env_password {
                store_keyring_password(profile, &password);
                return Some(password);
            }

            None
        }
    }
}

fn ssl_opts_from_profile(profile: &ConnectionProfile) -> Option<SslOpts> {
    if !profile_requests_tls(profile) {
        return None;
    }

    let mut ssl_opts = SslOpts::default()
        .with_danger_skip_domain_validation(matches!(profile.tls_mode, TlsMode::Require));

    if let Some(ca_cert_path) = non_empty(profile.tls_ca_cert_path.as_deref()) {
        ssl_opts = ssl_opts.with_root_certs(vec![PathBuf::from(ca_cert_path).into()]);
    }

    Some(ssl_opts)
}

fn profile_requests_tls(profile: &ConnectionProfile) -> bool {
    match profile.tls_mode {
        TlsMode::Disabled => false,
        TlsMode::Prefer => non_empty(profile.tls_ca_cert_path.as_deref()).is_some(),
        TlsMode::Require | TlsMode::VerifyIdentity => true,
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.and_then(|raw| {
        let trimmed = raw.trim();
        (!trimmed.is_empty()).then_some(trimmed)
    })
}

#[cfg(any(target_os = "linux", target_os = "macos", target_os = "windows"))]
fn load_keyring_password(profile: &ConnectionProfile) -> Option<String> {
    let entry = keyring_entry(profile)?;
    entry.get_password().ok().filter(|pw| !pw.is_empty())
}

#[cfg(not(any(target_os = "linux", target_os = "macos", target_os = "windows")))]
fn load_keyring_password(_profile: &ConnectionProfile) -> Option<String> {
    None
}

#[cfg(any(target_os = "linux", target_os = "macos", target_os = "windows"))]
fn store_keyring_password(profile: &ConnectionProfile, password: &str) {
    if password.is_empty() {
        return;
    }
    if let Some(entry) = keyring_entry(profile) {
        if let Err(error) = entry.set_password(password) {
            warn!(%error, "could not store password in keyring");
        }
    }
}

#[cfg(not(any(target_os = "linux", target_os = "macos", target_os = "windows")))]
fn store_keyring_password(_profile: &ConnectionProfile, _password: &str) {}

#[cfg(any(target_os = "linux", target_os = "macos", target_os = "windows"))]
fn keyring_entry(profile: &ConnectionProfile) -> Option<keyring::Entry> {
    keyring::Entry::new(KEYRING_SERVICE, &profile.display_target()).ok()
}

fn row_to_query_row(row: Row) -> QueryRow {
    row.unwrap().into_iter().map(mysql_value_to_string).collect()
}

fn mysql_value_to_string(value: Value) -> String {
    match value {
        Value::NULL => NULL_DISPLAY.to_string(),
        Value::Bytes(bytes) => String::from_utf8_lossy(&bytes).into_owned(),
        Value::Int(value) => value.to_string(),
        Value::UInt(value) => value.to_string(),
        Value::Float(value) => value.to_string(),
        Value::Double(value) => value.to_string(),
        Value::Date(year, month, day, 0, 0, 0, 0) => format!("{year:04}-{month:02}-{day:02}"),
        Value::Date(year, month, day, hour, minute, second, 0) => {
            format!("{year:04}-{month:02}-{day:02} {hour:02}:{minute:02}:{second:02}")
        }
        Value::Date(year, month, day, hour, minute, second, micros) => format!(
            "{year:04}-{month:02}-{day:02} {hour:02}:{minute:02}:{second:02}.{micros:06}"
        ),
        Value::Time(is_negative, days, hours, minutes, seconds, micros) => {
            let sign = if is_negative { "-" } else { "" };
            let hours = u32::from(hours) + days * 24;
            if micros == 0 {
                format!("{sign}{hours:02}:{minutes:02}:{seconds:02}")
            } else {
                format!("{sign}{hours:02}:{minutes:02}:{seconds:02}.{micros:06}")
            }
        }
    }
}

fn to_connection_error(error: mysql_async::Error) -> ConnectionError {
    ConnectionError::new(error.to_string())
}
