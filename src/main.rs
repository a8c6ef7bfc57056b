//! Entry point for the **spacecmd** daemon.
//!
//! Builds the label store, both backends and the [`SpaceManager`], then
//! spawns the configured [`CommandSource`](spacecmd::traits::CommandSource)s
//! on background threads and processes incoming commands on the main thread.
//! Switch commands are handed to the switch worker so a slow retry loop never
//! blocks refreshes or renames.
//!
//! `spacecmd --list` prints the current space list and exits.

use log::{error, info};
use spacecmd::command::Command;
use spacecmd::config::Config;
use spacecmd::error::{recovery_suggestion, user_message, ErrorKind};
use spacecmd::ipc::listener::UnixSocketListener;
use spacecmd::labels::{JsonLabelStore, LabelStore, ScopedLabels};
use spacecmd::manager::SpaceManager;
use spacecmd::native::backend::NativeBackend;
use spacecmd::native::system_platform;
use spacecmd::process::SystemRunner;
use spacecmd::settings::{Settings, SettingsEvent};
use spacecmd::traits::CommandSource;
use spacecmd::worker::{SwitchRequest, SwitchWorker};
use spacecmd::yabai::backend::YabaiBackend;
use spacecmd::{native, yabai};
use std::path::PathBuf;
use std::sync::{mpsc, Arc};

fn env_dir(var: &str, home_fallback: &str) -> PathBuf {
    match std::env::var(var) {
        Ok(dir) if !dir.is_empty() => PathBuf::from(dir),
        _ => {
            let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".into());
            PathBuf::from(home).join(home_fallback)
        }
    }
}

/// Resolve the config directory (`$XDG_CONFIG_HOME/spacecmd`).
fn config_dir() -> PathBuf {
    env_dir("XDG_CONFIG_HOME", ".config").join("spacecmd")
}

fn labels_path(config: &Config) -> PathBuf {
    config
        .labels_path
        .clone()
        .unwrap_or_else(|| env_dir("XDG_DATA_HOME", ".local/share").join("spacecmd/space_labels.json"))
}

fn socket_path(config: &Config) -> PathBuf {
    config.socket_path.clone().unwrap_or_else(|| {
        let runtime = std::env::var("XDG_RUNTIME_DIR").unwrap_or_else(|_| "/tmp".into());
        PathBuf::from(runtime).join("spacecmd.sock")
    })
}

/// Try to load the config from `$XDG_CONFIG_HOME/spacecmd/config.json`,
/// falling back to compiled-in defaults.
fn load_config() -> Config {
    let path = config_dir().join("config.json");
    match Config::load(&path) {
        Ok(cfg) => {
            info!("loaded config from {}", path.display());
            cfg
        }
        Err(e) => {
            info!("no config file ({}), using defaults", e);
            Config::default()
        }
    }
}

fn build_manager(config: &Config) -> SpaceManager {
    let store: Arc<dyn LabelStore> = Arc::new(JsonLabelStore::open(labels_path(config)));

    let yabai = YabaiBackend::locate(
        &config.yabai,
        ScopedLabels::new(store.clone(), yabai::backend::LABEL_SCOPE),
    );
    let platform = system_platform(SystemRunner::new(config.native.script_timeout()));
    let native = NativeBackend::new(
        Arc::new(platform),
        ScopedLabels::new(store, native::backend::LABEL_SCOPE),
        config.native.clone(),
    );

    SpaceManager::new(
        Box::new(yabai),
        Box::new(native),
        config.mode,
        config.verify.policy(),
    )
}

//  Main

fn main() {
    env_logger::init();

    let config = load_config();
    let manager = Arc::new(build_manager(&config));

    if std::env::args().any(|a| a == "--list") {
        print_spaces(&manager);
    } else {
        run_daemon(&config, manager);
    }
}

/// One-shot mode.
fn print_spaces(manager: &SpaceManager) {
    let spaces = manager.refresh_spaces();
    println!("backend: {}", manager.active_backend_name());
    if spaces.is_empty() {
        let kind = ErrorKind::BackendUnavailable;
        eprintln!("{}", user_message(kind));
        if let Some(hint) = recovery_suggestion(kind) {
            eprintln!("{}", hint);
        }
        return;
    }
    for space in &spaces {
        println!(
            "{} {:>2}  {:<24} id={}",
            if space.is_current { "*" } else { " " },
            space.index,
            space.display_name(),
            space.id
        );
    }
}

/// Normal daemon mode.
fn run_daemon(config: &Config, manager: Arc<SpaceManager>) {
    let settings = Settings::new(config.mode);
    spawn_settings_sink(&settings, manager.clone());

    manager.ensure_permissions();

    let worker = match SwitchWorker::spawn(manager.clone(), None) {
        Ok(worker) => worker,
        Err(e) => {
            error!("could not start switch worker: {}", e);
            return;
        }
    };

    let (cmd_tx, cmd_rx) = mpsc::channel::<Command>();
    spawn_command_sources(cmd_tx, socket_path(config));

    info!("spacecmd running, backend: {}", manager.active_backend_name());
    for cmd in cmd_rx {
        if let Some(request) = SwitchRequest::from_command(&cmd) {
            worker.submit(request);
            continue;
        }
        match cmd {
            Command::SetMode(mode) => {
                settings.set_mode(mode);
            }
            other => {
                manager.handle(other);
            }
        }
    }
    info!("all command sources closed, exiting");
    worker.shutdown();
}

//  Helpers

/// Apply settings changes to the manager as they are published.
fn spawn_settings_sink(settings: &Settings, manager: Arc<SpaceManager>) {
    let rx = settings.subscribe();
    std::thread::spawn(move || {
        for event in rx {
            match event {
                SettingsEvent::ModeChanged(mode) => manager.set_mode(mode),
            }
        }
    });
}

fn spawn_command_sources(tx: mpsc::Sender<Command>, path: PathBuf) {
    std::thread::spawn(move || {
        let mut source = UnixSocketListener::new(&path);
        if let Err(e) = source.run(tx) {
            error!("socket listener error: {}", e);
        }
    });
}
