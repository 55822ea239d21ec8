use tracing_subscriber::EnvFilter;

/// Environment variable holding the log filter, e.g. `seqdraw=debug`
const LOG_ENV: &str = "SEQDRAW_LOG";

fn main() {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    if let Err(err) = run() {
        tracing::error!(error = %err, "seqdraw exited with an error");
        std::process::exit(1);
    }
}

#[cfg(windows)]
fn run() -> Result<(), seqdraw::app::AppError> {
    use seqdraw::app::EditorController;
    use seqdraw::config::PreferencesStore;
    use seqdraw::export::ExportPipeline;
    use seqdraw::platform::detect_system_theme;
    use seqdraw::platform::window::{self, APP_TITLE};
    use seqdraw::ui::SceneRenderer;
    use seqdraw::ui::prompt_dialog::Win32Shell;

    let exporter = ExportPipeline::platform_default();
    tracing::info!(strategies = ?exporter.strategy_names(), "export chain ready");

    let controller = EditorController::new(
        Win32Shell::new(APP_TITLE),
        PreferencesStore::default_location(),
        exporter,
        detect_system_theme,
    );

    window::run(controller, SceneRenderer::new())?;
    Ok(())
}

#[cfg(not(windows))]
fn run() -> Result<(), seqdraw::app::AppError> {
    tracing::error!("the seqdraw editor window is only available on Windows");
    std::process::exit(2);
}
