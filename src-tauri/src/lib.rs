pub mod analyzer;
mod commands;
pub mod config;
pub mod encoder;
pub mod error;
pub mod session;

pub use analyzer::{AnalysisConfig, AnalysisReport, ReasoningService};
pub use encoder::{EncodedFile, FilePayload, MAX_FILE_BYTES};
pub use error::AnalysisError;
pub use session::{Session, SessionHandle, SessionSnapshot, SessionStatus};

pub fn run() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let result = tauri::Builder::default()
        .plugin(tauri_plugin_store::Builder::new().build())
        .manage(SessionHandle::new())
        .invoke_handler(tauri::generate_handler![
            commands::analyzer::analyze_files,
            commands::analyzer::get_session,
            commands::analyzer::reset_session,
            commands::keychain::set_api_key,
            commands::keychain::get_api_key,
            commands::keychain::delete_api_key,
            commands::config::get_preference,
            commands::config::set_preference,
            commands::health::run_health_check,
            commands::models::list_models,
        ])
        .setup(|_app| {
            // Broken override files are reported here as well as on each analysis.
            let path = config::analysis_config_path();
            let (_, applied) = config::resolve_analysis_config(path.as_deref());
            if let Some(applied) = applied {
                tracing::info!("Analysis prompts overridden by {:?}", applied);
            }
            Ok(())
        })
        .run(tauri::generate_context!());

    if let Err(e) = result {
        tracing::error!("NeuroLens exited with an error: {}", e);
        std::process::exit(1);
    }
}
