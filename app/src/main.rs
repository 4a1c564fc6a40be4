mod cli;
mod logging;
mod session;

use clap::Parser;
use qgrid_adapters::editor::ExternalEditor;
use qgrid_adapters::mysql::MysqlConnection;
use qgrid_core::settings::{self, Settings};
use qgrid_tui::effects::LiveEffects;
use qgrid_tui::theme::Theme;
use tracing::{info, warn};

use crate::cli::Cli;
use crate::session::{resolve_query_parameters, Session};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let config_dir = cli.config_dir.clone().map_or_else(settings::config_dir, Ok);
    let settings = match &config_dir {
        Ok(dir) => Settings::load_from_dir(dir)?,
        Err(_) => Settings::default(),
    };
    logging::init(config_dir.as_deref().ok());
    info!(version = env!("CARGO_PKG_VERSION"), "qgrid starting");

    // Parameter mistakes are reported before a connection is attempted.
    let values = resolve_query_parameters(&cli.sql, &cli.params)?;
    let editor = ExternalEditor::from_command(&settings.editor_command())?;
    let theme = Theme::from_scheme(settings.scheme());

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;
    let profile = cli.profile();
    let connection = runtime.block_on(MysqlConnection::connect(&profile))?;

    let session = Session::new(&connection, runtime.handle().clone(), &settings, values)
        .with_row_limit(cli.limit.unwrap_or(settings.row_limit))
        .with_table(cli.table.clone());
    let mut effects = LiveEffects::new(&connection, runtime.handle().clone(), editor);
    let outcome = session.run(&cli.sql, |grid| {
        Ok(qgrid_tui::run(grid, &mut effects, &theme)?)
    });

    if let Err(error) = runtime.block_on(connection.disconnect()) {
        warn!(%error, "disconnect failed");
    }
    outcome?;
    info!("qgrid finished");
    Ok(())
}
