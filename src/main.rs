mod app;
mod detect;
mod model;
mod msg;
mod preflight;
mod runner;
mod ui;

use std::io;
use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use anyhow::{Context, Result};
use crossterm::event::{self, Event};
use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use tracing_subscriber::EnvFilter;

use app::{App, Environment};
use detect::InstallPaths;
use model::config::InstallerConfig;
use msg::Msg;
use preflight::PreflightInputs;
use runner::{RunLog, TaskPlan, TaskRunner};
use ui::Theme;

fn main() -> Result<()> {
    let debug = std::env::args().skip(1).any(|arg| arg == "--debug");

    // Initialize logging to file (never stdout)
    let log_dir = directories::ProjectDirs::from("", "", "cursor-acp-installer")
        .map(|d| d.data_dir().to_path_buf())
        .unwrap_or_else(std::env::temp_dir);
    std::fs::create_dir_all(&log_dir)?;

    let file_appender = tracing_appender::rolling::daily(&log_dir, "installer.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);
    let default_level = if debug {
        "cursor_acp_installer=debug"
    } else {
        "cursor_acp_installer=info"
    };
    tracing_subscriber::fmt()
        .with_writer(non_blocking)
        .with_ansi(false)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .init();

    tracing::info!(
        "cursor-acp-installer starting as {}",
        detect::detect_actual_user()
    );

    let config = InstallerConfig::load()?;
    let env = detect_environment(&config)?;

    // Terminal setup
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = run(&mut terminal, config, env);

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Err(e) = &result {
        tracing::error!("installer error: {e:?}");
    }

    result
}

/// Read-only startup probes. Only a missing home directory is fatal.
fn detect_environment(config: &InstallerConfig) -> Result<Environment> {
    let config_root = detect::resolve_config_dir().context("resolve config directory")?;
    let paths = InstallPaths::new(&config_root, &config.host, &config.plugin);

    let host = detect::detect_host_install(&config.host.binary, &paths);
    tracing::debug!(
        "host dirs: config {} plugin {} modules {}",
        host.config_dir.display(),
        host.plugin_dir.display(),
        host.node_modules_dir.display()
    );
    let (existing_setup, inspected) =
        detect::detect_existing_setup(&paths, &config.plugin.provider_key);
    tracing::info!(
        "existing setup {existing_setup} (inspected {})",
        inspected.display()
    );

    let package_manager = detect::PackageManager::detect();
    let agent = detect::agent_status(&config.agent.binary, &config.agent.logged_out_marker);
    let project_dir = detect::resolve_project_dir(&config.install.project_dir_env);

    let inputs = PreflightInputs {
        host_binary: config.host.binary.clone(),
        host,
        package_manager,
        agent_binary: config.agent.binary.clone(),
        agent: agent.clone(),
        config_dir: paths.host_dir.clone(),
        config_writable: preflight::is_writable(&paths.host_dir),
        has_package_json: project_dir.join("package.json").is_file(),
        project_dir: project_dir.clone(),
        project_dir_env: config.install.project_dir_env.clone(),
    };
    let checks = preflight::run_checks(&inputs);

    Ok(Environment {
        paths,
        project_dir,
        package_manager,
        agent_logged_in: agent.is_logged_in(),
        existing_setup,
        checks,
    })
}

fn run(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    config: InstallerConfig,
    env: Environment,
) -> Result<()> {
    let (tx, rx) = mpsc::channel::<Msg>();
    let tick = Duration::from_millis(config.ui.tick_ms);
    let log_dir = config.log_dir();
    let mut app = App::new(config, Theme::default(), env);

    // Input thread: terminal events forwarded as Msg
    let tx_input = tx.clone();
    thread::spawn(move || {
        loop {
            if let Ok(event) = event::read() {
                let msg = match event {
                    Event::Key(k) => Msg::Key(k),
                    Event::Resize(w, h) => Msg::Resize(w, h),
                    _ => continue,
                };
                if tx_input.send(msg).is_err() {
                    break;
                }
            }
        }
    });

    // Tick thread: drives the spinner
    let tx_tick = tx.clone();
    thread::spawn(move || {
        loop {
            thread::sleep(tick);
            if tx_tick.send(Msg::Tick).is_err() {
                break;
            }
        }
    });

    let size = terminal.size()?;
    app.update(Msg::Resize(size.width, size.height));
    terminal.draw(|f| app.view(f))?;

    // ── Main event loop ──
    loop {
        // Batch-drain all pending messages
        let first = rx.recv()?;
        app.update(first);

        while let Ok(msg) = rx.try_recv() {
            app.update(msg);
        }

        if app.should_quit {
            break;
        }

        if let Some(plans) = app.take_pending_run() {
            spawn_runner(plans, &log_dir, tx.clone());
        }

        terminal.draw(|f| app.view(f))?;
    }

    Ok(())
}

/// Run the plans on a worker thread, one at a time, reporting through `tx`.
fn spawn_runner(plans: Vec<TaskPlan>, log_dir: &std::path::Path, tx: mpsc::Sender<Msg>) {
    let log = match RunLog::create(log_dir) {
        Ok(log) => {
            tracing::info!("run log at {}", log.path().display());
            Some(log)
        }
        Err(err) => {
            tracing::warn!("failed to create run log in {}: {err}", log_dir.display());
            None
        }
    };

    thread::spawn(move || {
        let mut runner = TaskRunner::new(log);
        runner.run(&plans, |event| {
            let _ = tx.send(Msg::Task(event));
        });
        let _ = tx.send(Msg::RunFinished);
    });
}
