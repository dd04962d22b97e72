// Re-export core crate modules so crate::state, crate::action, etc. resolve throughout the binary
pub use strumkit_core::action;
pub use strumkit_core::config;
pub use strumkit_core::dispatch;
pub use strumkit_core::state;

mod app;
mod panes;
mod ui;

use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use strumkit_audio::{AudioEngine, AudioOutput};
use strumkit_core::persistence::Storage;
use strumkit_core::transport::Transport;

use action::Severity;
use app::App;
use config::Config;
use state::AppState;
use ui::RatatuiBackend;

fn init_logging(verbose: bool) {
    use simplelog::{LevelFilter, WriteLogger};

    let log_level = if verbose { LevelFilter::Debug } else { LevelFilter::Warn };

    let log_path = dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("strumkit")
        .join("strumkit.log");

    if let Some(parent) = log_path.parent() {
        let _ = std::fs::create_dir_all(parent);
    }

    let log_file = match File::create(&log_path)
        .or_else(|_| File::create(std::env::temp_dir().join("strumkit.log")))
    {
        Ok(file) => file,
        Err(e) => {
            eprintln!("strumkit: logging disabled: {}", e);
            return;
        }
    };

    if WriteLogger::init(log_level, simplelog::Config::default(), log_file).is_err() {
        eprintln!("strumkit: logger already initialized");
        return;
    }

    log::info!("strumkit starting (log level: {:?})", log_level);
}

fn open_storage(config: &Config) -> Option<Storage> {
    let path = config.database_path()?;
    match Storage::open(&path) {
        Ok(storage) => Some(storage),
        Err(e) => {
            log::error!(target: "persistence", "could not open {}: {}", path.display(), e);
            None
        }
    }
}

/// `--import <file>`: upgrade a legacy or exported JSON file into the
/// database, then exit.
fn run_import(storage: Option<Storage>, path: &Path) -> std::io::Result<()> {
    let Some(storage) = storage else {
        eprintln!("No database available to import into");
        std::process::exit(1);
    };
    match storage.import_legacy(path) {
        Ok(data) => {
            println!(
                "Imported {} custom patterns and {} saved sets into {}",
                data.custom_patterns.len(),
                data.saved_sets.len(),
                storage.path().display()
            );
            Ok(())
        }
        Err(e) => {
            eprintln!("Import failed: {}", e);
            std::process::exit(1);
        }
    }
}

fn main() -> std::io::Result<()> {
    let args: Vec<String> = std::env::args().collect();
    let verbose = args.iter().any(|a| a == "--verbose" || a == "-v");
    init_logging(verbose);

    let import_path = args
        .iter()
        .position(|a| a == "--import")
        .and_then(|i| args.get(i + 1))
        .map(PathBuf::from);

    let config = Config::load();
    let storage = open_storage(&config);

    if let Some(path) = import_path {
        return run_import(storage, &path);
    }

    let mut state = AppState::from_config(&config);
    if let Some(storage) = storage.as_ref() {
        match storage.load() {
            Ok(data) => state.restore(data),
            Err(e) => {
                log::error!(target: "persistence", "failed to load stored data: {}", e);
                state.set_status(format!("Could not load saved data: {}", e), Severity::Error);
            }
        }
    }

    let output: Arc<dyn AudioOutput> = Arc::new(AudioEngine::new(config.engine_settings()));
    let transport = Transport::new(output, config.scheduler_timing())
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e.to_string()))?;

    let mut app = App::new(state, transport, storage);

    let mut backend = RatatuiBackend::new()?;
    backend.start()?;

    let result = app.run(&mut backend);

    backend.stop()?;
    result
}
