use std::path::PathBuf;

use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use ratatui::Frame;

use crate::detect::{InstallPaths, PackageManager};
use crate::model::check::CheckResult;
use crate::model::config::InstallerConfig;
use crate::model::state::{InstallerState, Step};
use crate::model::task::{ExecError, FailureReason, TaskStatus, all_terminal};
use crate::msg::Msg;
use crate::runner::{self, PlanContext, TaskPlan};
use crate::ui::{self, Names, Screen, Theme};

/// What startup detection found, handed to the app once.
#[derive(Debug, Clone)]
pub struct Environment {
    pub paths: InstallPaths,
    pub project_dir: PathBuf,
    pub package_manager: Option<PackageManager>,
    pub agent_logged_in: bool,
    pub existing_setup: bool,
    pub checks: Vec<CheckResult>,
}

pub struct App {
    pub state: InstallerState,
    pub should_quit: bool,
    config: InstallerConfig,
    env: Environment,
    theme: Theme,
    names: Names,
    spinner_idx: usize,
    /// Last known terminal size in columns and rows.
    size: (u16, u16),
    pending_run: Option<Vec<TaskPlan>>,
}

impl App {
    pub fn new(config: InstallerConfig, theme: Theme, env: Environment) -> Self {
        let state = InstallerState {
            step: Step::Welcome,
            checks: env.checks.clone(),
            tasks: Vec::new(),
            existing_setup: env.existing_setup,
            is_uninstall: false,
            plugin_link: env.paths.plugin_link.clone(),
            config_path: env.paths.config_path.clone(),
        };
        // assume usable until the terminal reports otherwise
        let size = (config.ui.min_width, config.ui.min_height);
        let names = Names {
            host: config.host.binary.clone(),
            agent: config.agent.binary.clone(),
            provider_key: config.plugin.provider_key.clone(),
        };

        Self {
            state,
            should_quit: false,
            config,
            env,
            theme,
            names,
            spinner_idx: 0,
            size,
            pending_run: None,
        }
    }

    pub fn update(&mut self, msg: Msg) {
        match msg {
            Msg::Key(key) => self.handle_key(key),
            Msg::Task(event) => self.handle_task_event(event),
            Msg::RunFinished => self.finish_run(),
            Msg::Tick => {
                if self.state.step.is_running() {
                    self.spinner_idx = (self.spinner_idx + 1) % ui::SPINNER_LEN;
                }
            }
            Msg::Resize(w, h) => {
                tracing::debug!("terminal resized to {w}x{h}");
                self.size = (w, h);
            }
        }
    }

    pub fn view(&self, frame: &mut Frame) {
        let screen = Screen {
            state: &self.state,
            theme: &self.theme,
            spinner_idx: self.spinner_idx,
            min_size: (self.config.ui.min_width, self.config.ui.min_height),
            agent_logged_in: self.env.agent_logged_in,
            names: &self.names,
        };
        ui::draw(frame, &screen);
    }

    fn too_small(&self) -> bool {
        let (w, h) = self.size;
        w < self.config.ui.min_width || h < self.config.ui.min_height
    }

    /// Plans queued by the last step change, handed out at most once.
    pub fn take_pending_run(&mut self) -> Option<Vec<TaskPlan>> {
        self.pending_run.take()
    }

    fn handle_key(&mut self, key: KeyEvent) {
        if key.kind == KeyEventKind::Release {
            return;
        }

        let ctrl_c =
            key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c');
        if ctrl_c || key.code == KeyCode::Char('q') {
            if self.state.step.is_running() {
                tracing::warn!("quit requested mid-run, leaving partial changes in place");
            }
            self.should_quit = true;
            return;
        }

        // only the size notice is on screen
        if self.too_small() {
            return;
        }

        match (self.state.step, key.code) {
            (Step::Welcome, KeyCode::Enter) if self.state.can_proceed() => self.begin(false),
            (Step::Welcome, KeyCode::Char('u')) if self.state.existing_setup => self.begin(true),
            (Step::Complete, KeyCode::Enter) => self.should_quit = true,
            _ => {}
        }
    }

    fn begin(&mut self, uninstall: bool) {
        let ctx = PlanContext {
            config: &self.config,
            paths: &self.env.paths,
            project_dir: self.env.project_dir.clone(),
            // uninstall never invokes a package manager
            package_manager: self.env.package_manager.unwrap_or(PackageManager::Npm),
        };
        let plans = if uninstall {
            runner::uninstall_plan(&ctx)
        } else {
            runner::install_plan(&ctx)
        };

        self.state.is_uninstall = uninstall;
        self.state.tasks = plans.iter().map(|plan| plan.task.clone()).collect();
        self.state.step = if uninstall {
            Step::Uninstalling
        } else {
            Step::Installing
        };
        tracing::info!(
            "{} started with {} tasks",
            self.state.action_label(),
            plans.len()
        );
        self.pending_run = Some(plans);
    }

    fn handle_task_event(&mut self, event: runner::TaskEvent) {
        if !self.state.step.is_running() {
            return;
        }
        if let Err(err) = runner::apply_event(&mut self.state.tasks, event) {
            tracing::warn!("ignoring task event: {err}");
            return;
        }
        if all_terminal(&self.state.tasks) {
            self.finish_run();
        }
    }

    fn finish_run(&mut self) {
        if !self.state.step.is_running() {
            return;
        }
        self.fail_unreported();
        self.state.step = Step::Complete;
        if self.state.has_critical_failure() {
            tracing::warn!("{} failed", self.state.action_label());
        } else {
            tracing::info!("{} complete", self.state.action_label());
        }
    }

    /// Tasks the runner never finished count as failed.
    fn fail_unreported(&mut self) {
        for task in &mut self.state.tasks {
            if task.status().is_terminal() {
                continue;
            }
            tracing::warn!("task {} never reported an outcome", task.name);
            let error = ExecError::new(
                format!("{} failed", task.name),
                "",
                "runner stopped before the task finished",
                FailureReason::Unreported,
            );
            let result = if task.status() == TaskStatus::Pending {
                task.start().and_then(|()| task.fail(error))
            } else {
                task.fail(error)
            };
            if let Err(err) = result {
                tracing::warn!("{err}");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runner::{TaskEvent, TaskOutcome};
    use std::path::Path;

    fn key(code: KeyCode) -> Msg {
        Msg::Key(KeyEvent::new(code, KeyModifiers::NONE))
    }

    fn app(checks: Vec<CheckResult>, existing_setup: bool) -> App {
        let config = InstallerConfig::defaults().unwrap();
        let paths = InstallPaths::new(Path::new("/home/a/.config"), &config.host, &config.plugin);
        let env = Environment {
            paths,
            project_dir: PathBuf::from("/src/open-cursor"),
            package_manager: Some(PackageManager::Bun),
            agent_logged_in: true,
            existing_setup,
            checks,
        };
        App::new(config, Theme::default(), env)
    }

    fn finish_all(app: &mut App, outcome: impl Fn(usize) -> TaskOutcome) {
        for index in 0..app.state.tasks.len() {
            app.update(Msg::Task(TaskEvent::Started(index)));
            app.update(Msg::Task(TaskEvent::Finished {
                index,
                outcome: outcome(index),
            }));
        }
    }

    #[test]
    fn enter_starts_install_when_checks_pass() {
        let mut app = app(vec![CheckResult::pass("opencode CLI", "1.0")], false);
        app.update(key(KeyCode::Enter));

        assert_eq!(app.state.step, Step::Installing);
        assert!(!app.state.is_uninstall);
        assert_eq!(app.state.tasks.len(), 7);
        assert!(app.state.tasks.iter().all(|t| t.status() == TaskStatus::Pending));
        assert_eq!(app.take_pending_run().map(|p| p.len()), Some(7));
        assert!(app.take_pending_run().is_none());
    }

    #[test]
    fn hard_failure_blocks_install() {
        let mut app = app(vec![CheckResult::fail("Plugin source", "missing")], true);
        app.update(key(KeyCode::Enter));
        assert_eq!(app.state.step, Step::Welcome);
        assert!(app.take_pending_run().is_none());
    }

    #[test]
    fn uninstall_needs_existing_setup() {
        let mut fresh = app(Vec::new(), false);
        fresh.update(key(KeyCode::Char('u')));
        assert_eq!(fresh.state.step, Step::Welcome);

        let mut configured = app(Vec::new(), true);
        configured.update(key(KeyCode::Char('u')));
        assert_eq!(configured.state.step, Step::Uninstalling);
        assert!(configured.state.is_uninstall);
        assert_eq!(configured.state.tasks.len(), 3);
    }

    #[test]
    fn enter_is_ignored_while_running() {
        let mut app = app(Vec::new(), false);
        app.update(key(KeyCode::Enter));
        app.take_pending_run();
        app.update(key(KeyCode::Enter));
        assert_eq!(app.state.step, Step::Installing);
        assert!(app.take_pending_run().is_none());
        assert!(!app.should_quit);
    }

    #[test]
    fn last_task_event_completes_the_run() {
        let mut app = app(Vec::new(), false);
        app.update(key(KeyCode::Enter));
        app.update(Msg::Tick);
        finish_all(&mut app, |_| TaskOutcome::Complete);

        assert_eq!(app.state.step, Step::Complete);
        assert!(!app.state.has_critical_failure());

        app.update(key(KeyCode::Enter));
        assert!(app.should_quit);
    }

    #[test]
    fn required_failure_is_reported_at_completion() {
        let mut app = app(Vec::new(), false);
        app.update(key(KeyCode::Enter));
        finish_all(&mut app, |index| {
            if index == 1 {
                TaskOutcome::Failed(ExecError::new(
                    "Build plugin failed",
                    "",
                    "exit status: 1",
                    FailureReason::NonZeroExit(Some(1)),
                ))
            } else {
                TaskOutcome::Complete
            }
        });
        assert_eq!(app.state.step, Step::Complete);
        assert!(app.state.has_critical_failure());
    }

    #[test]
    fn quit_keys_work_on_every_step() {
        let mut app = app(Vec::new(), false);
        app.update(Msg::Key(KeyEvent::new(
            KeyCode::Char('c'),
            KeyModifiers::CONTROL,
        )));
        assert!(app.should_quit);

        let mut running = self::app(Vec::new(), false);
        running.update(key(KeyCode::Enter));
        running.update(key(KeyCode::Char('q')));
        assert!(running.should_quit);
    }

    #[test]
    fn undersized_terminal_ignores_everything_but_quit() {
        let mut app = app(Vec::new(), true);
        app.update(Msg::Resize(40, 10));
        app.update(key(KeyCode::Enter));
        app.update(key(KeyCode::Char('u')));
        assert_eq!(app.state.step, Step::Welcome);
        assert!(app.take_pending_run().is_none());

        app.update(Msg::Resize(80, 24));
        app.update(key(KeyCode::Enter));
        assert_eq!(app.state.step, Step::Installing);

        app.update(Msg::Resize(79, 30));
        app.update(key(KeyCode::Char('q')));
        assert!(app.should_quit);
    }

    #[test]
    fn unreported_tasks_fail_the_run() {
        let mut app = app(Vec::new(), false);
        app.update(key(KeyCode::Enter));
        app.update(Msg::Task(TaskEvent::Started(0)));
        app.update(Msg::Task(TaskEvent::Finished {
            index: 0,
            outcome: TaskOutcome::Complete,
        }));
        app.update(Msg::Task(TaskEvent::Started(1)));
        app.update(Msg::RunFinished);

        assert_eq!(app.state.step, Step::Complete);
        assert_eq!(app.state.tasks[0].status(), TaskStatus::Complete);
        assert!(app.state.tasks[1..].iter().all(|t| t.status() == TaskStatus::Failed));
        assert_eq!(
            app.state.tasks[1].error().map(|e| e.reason()),
            Some(FailureReason::Unreported)
        );
        assert!(app.state.has_critical_failure());
    }

    #[test]
    fn run_finished_without_events_fails_every_task() {
        let mut app = app(Vec::new(), true);
        app.update(key(KeyCode::Char('u')));
        app.update(Msg::RunFinished);
        assert_eq!(app.state.step, Step::Complete);
        assert!(app.state.tasks.iter().all(|t| t.status() == TaskStatus::Failed));

        // late events after completion are dropped
        app.update(Msg::Task(TaskEvent::Finished {
            index: 0,
            outcome: TaskOutcome::Complete,
        }));
        assert_eq!(app.state.tasks[0].status(), TaskStatus::Failed);
    }
}
