use std::path::PathBuf;
use std::process::ExitCode;

use plexus::SceneOptions;

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config_path = std::env::args_os().nth(1).map(PathBuf::from);
    let options = match &config_path {
        Some(path) if path.exists() => SceneOptions::load(path).unwrap_or_else(|e| {
            log::warn!("could not load {}: {}; using defaults", path.display(), e);
            SceneOptions::default()
        }),
        _ => SceneOptions::default(),
    };

    match plexus::window::run(options, config_path) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{}", e);
            ExitCode::FAILURE
        }
    }
}
