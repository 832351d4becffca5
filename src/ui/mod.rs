pub mod theme;

use ratatui::Frame;
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::style::Modifier;
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, BorderType, Borders, Padding, Paragraph, Wrap};

use crate::model::check::CheckResult;
use crate::model::state::{InstallerState, Step};
use crate::model::task::{Task, TaskStatus};

pub use theme::Theme;

const SPINNER: [&str; 10] = ["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];
pub const SPINNER_LEN: usize = SPINNER.len();

/// Everything a frame needs, borrowed from the app for one draw.
pub struct Screen<'a> {
    pub state: &'a InstallerState,
    pub theme: &'a Theme,
    pub spinner_idx: usize,
    pub min_size: (u16, u16),
    pub agent_logged_in: bool,
    pub names: &'a Names,
}

/// Product names shown on screen.
#[derive(Debug, Clone)]
pub struct Names {
    pub host: String,
    pub agent: String,
    pub provider_key: String,
}

pub fn draw(frame: &mut Frame, screen: &Screen<'_>) {
    let area = frame.area();
    let theme = screen.theme;
    let (min_w, min_h) = screen.min_size;

    frame.render_widget(Block::default().style(theme.base()), area);

    if area.width < min_w || area.height < min_h {
        let notice = Paragraph::new(too_small_text(area, screen.min_size))
            .style(theme.fail().bg(theme.bg).add_modifier(Modifier::BOLD));
        frame.render_widget(notice, area);
        return;
    }

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(2), // title
            Constraint::Min(1),    // body
            Constraint::Length(1), // help
        ])
        .split(area);

    let title = Paragraph::new(Line::from(Span::styled(
        format!("{} ⇄ {}", screen.names.host, screen.names.provider_key),
        theme.heading(),
    )))
    .alignment(Alignment::Center);
    frame.render_widget(title, chunks[0]);

    let body = Paragraph::new(body_lines(screen))
        .wrap(Wrap { trim: false })
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_type(BorderType::Rounded)
                .border_style(theme.active())
                .padding(Padding::new(2, 2, 1, 1))
                .title(format!(" {} ", screen.state.step.label())),
        );
    frame.render_widget(body, inset(chunks[1], 2));

    let help = Paragraph::new(Span::styled(help_text(screen.state), theme.hint()))
        .alignment(Alignment::Center);
    frame.render_widget(help, chunks[2]);
}

pub fn too_small_text(area: Rect, (min_w, min_h): (u16, u16)) -> String {
    format!(
        "Terminal too small!\n\nMinimum: {min_w}x{min_h}\nCurrent: {}x{}\n\nPlease resize.",
        area.width, area.height
    )
}

pub fn help_text(state: &InstallerState) -> &'static str {
    match state.step {
        Step::Welcome if state.existing_setup => "Enter: Install  •  u: Uninstall  •  q: Quit",
        Step::Welcome => "Enter: Install  •  q: Quit",
        Step::Installing | Step::Uninstalling => "Please wait...  •  q: Quit",
        Step::Complete => "Enter: Exit",
    }
}

pub fn body_lines(screen: &Screen<'_>) -> Vec<Line<'static>> {
    match screen.state.step {
        Step::Welcome => welcome_lines(screen),
        Step::Installing | Step::Uninstalling => task_lines(screen, true),
        Step::Complete => complete_lines(screen),
    }
}

fn welcome_lines(screen: &Screen<'_>) -> Vec<Line<'static>> {
    let theme = screen.theme;
    let state = screen.state;
    let mut lines = vec![
        Line::from(Span::styled(
            format!("{} Plugin Installer", screen.names.provider_key),
            theme.heading(),
        )),
        Line::default(),
        Line::from("Pre-install checks:"),
        Line::default(),
    ];

    lines.extend(state.checks.iter().map(|check| check_line(check, theme)));
    lines.push(Line::default());

    if state.existing_setup {
        lines.push(Line::from(Span::styled(
            format!("⚠ {} already configured", screen.names.provider_key),
            theme.warn(),
        )));
        lines.push(Line::default());
    }

    if !state.can_proceed() {
        lines.push(Line::from(Span::styled(
            "Fix errors above before installing",
            theme.fail(),
        )));
        if state.existing_setup {
            lines.push(Line::from(Span::styled(
                "Press 'u' to uninstall",
                theme.fail().add_modifier(Modifier::BOLD),
            )));
        }
    } else if state.existing_setup {
        lines.push(Line::from(vec![
            Span::styled("Press Enter to reinstall", theme.heading()),
            Span::raw("  •  "),
            Span::styled(
                "Press 'u' to uninstall",
                theme.fail().add_modifier(Modifier::BOLD),
            ),
        ]));
    } else {
        lines.push(Line::from(Span::styled(
            "Press Enter to install",
            theme.heading(),
        )));
    }

    lines
}

fn check_line(check: &CheckResult, theme: &Theme) -> Line<'static> {
    let mark_style = if check.passed {
        theme.ok()
    } else if check.warning {
        theme.warn()
    } else {
        theme.fail()
    };
    Line::from(vec![
        Span::raw("  "),
        Span::styled(check.label(), mark_style),
        Span::raw(format!(" {}: {}", check.name, check.message)),
    ])
}

fn task_lines(screen: &Screen<'_>, live: bool) -> Vec<Line<'static>> {
    let theme = screen.theme;
    let mut lines = Vec::new();

    for task in &screen.state.tasks {
        lines.push(task_line(task, screen, live));
        if task.status() == TaskStatus::Failed {
            lines.extend(failure_lines(task, theme));
        }
    }
    lines
}

fn task_line(task: &Task, screen: &Screen<'_>, live: bool) -> Line<'static> {
    let theme = screen.theme;
    let optional = if task.optional { " (optional)" } else { "" };
    match task.status() {
        TaskStatus::Pending => Line::from(Span::styled(
            format!("  {}{optional}", task.name),
            theme.muted(),
        )),
        TaskStatus::Running if live => Line::from(vec![
            Span::styled(SPINNER[screen.spinner_idx % SPINNER_LEN], theme.active()),
            Span::raw(" "),
            Span::styled(task.description.clone(), theme.active()),
        ]),
        TaskStatus::Running => Line::from(Span::styled(
            format!("  {}", task.name),
            theme.muted(),
        )),
        TaskStatus::Complete => mark_line("[OK]", theme.ok(), &task.name),
        TaskStatus::Failed => {
            mark_line("[FAIL]", theme.fail(), &format!("{}{optional}", task.name))
        }
        TaskStatus::Skipped => {
            mark_line("[SKIP]", theme.warn(), &format!("{}{optional}", task.name))
        }
    }
}

fn mark_line(mark: &'static str, style: ratatui::style::Style, name: &str) -> Line<'static> {
    Line::from(vec![
        Span::styled(mark, style),
        Span::raw(format!(" {name}")),
    ])
}

fn failure_lines(task: &Task, theme: &Theme) -> Vec<Line<'static>> {
    let Some(err) = task.error() else {
        return Vec::new();
    };

    let mut lines = vec![Line::from(Span::styled(
        format!("  └─ Error: {}", err.message()),
        theme.fail(),
    ))];
    if !err.cause().is_empty() {
        lines.push(Line::from(Span::styled(
            format!("  └─ Cause: {}", err.cause()),
            theme.fail(),
        )));
    }
    if let Some(path) = err.log_file() {
        lines.push(Line::from(Span::styled(
            format!("  └─ See logs: {}", path.display()),
            theme.muted(),
        )));
    }
    if let Some(hint) = err.hint() {
        lines.push(Line::from(Span::styled(
            format!("  └─ {hint}"),
            theme.warn(),
        )));
    }
    lines
}

fn complete_lines(screen: &Screen<'_>) -> Vec<Line<'static>> {
    let theme = screen.theme;
    let state = screen.state;
    let names = screen.names;

    if state.has_critical_failure() {
        let mut lines = vec![
            Line::from(Span::styled(
                format!("✗ {} Failed", state.action_label()),
                theme.fail().add_modifier(Modifier::BOLD),
            )),
            Line::default(),
        ];
        lines.extend(task_lines(screen, false));
        lines.push(Line::default());
        lines.push(Line::from(Span::styled("Press Enter to exit", theme.muted())));
        return lines;
    }

    let mut lines = vec![
        Line::from(Span::styled(
            format!("✓ {} Complete", state.action_label()),
            theme.ok().add_modifier(Modifier::BOLD),
        )),
        Line::default(),
    ];

    if state.is_uninstall {
        lines.push(Line::from(format!(
            "The {} plugin has been removed from {}.",
            names.provider_key, names.host
        )));
    } else {
        lines.push(Line::from(format!(
            "The {} provider is now available in {}.",
            names.provider_key, names.host
        )));
        lines.push(Line::default());
        lines.push(Line::from(Span::styled("Quick Start", theme.heading())));
        lines.push(Line::from(vec![
            Span::styled(format!("  {}", names.host), theme.active()),
            Span::styled("  Start OpenCode", theme.muted()),
        ]));
        lines.push(Line::from(vec![
            Span::styled(format!("  {}/auto", names.provider_key), theme.active()),
            Span::styled("  Use as model name", theme.muted()),
        ]));
        lines.push(Line::default());

        if !screen.agent_logged_in {
            lines.push(Line::from(Span::styled(
                format!("⚠ Remember to run: {} login", names.agent),
                theme.warn(),
            )));
            lines.push(Line::default());
        }

        lines.push(Line::from(vec![
            Span::raw("Plugin:  "),
            Span::styled(state.plugin_link.display().to_string(), theme.hint()),
        ]));
        lines.push(Line::from(vec![
            Span::raw("Config:  "),
            Span::styled(state.config_path.display().to_string(), theme.hint()),
        ]));
    }

    // optional tasks that did not succeed are still worth a mention
    let advisory: Vec<&Task> = state
        .tasks
        .iter()
        .filter(|t| matches!(t.status(), TaskStatus::Failed | TaskStatus::Skipped))
        .collect();
    if !advisory.is_empty() {
        lines.push(Line::default());
        for task in advisory {
            lines.push(task_line(task, screen, false));
            lines.extend(failure_lines(task, theme));
        }
    }

    lines.push(Line::default());
    lines.push(Line::from(Span::styled("Press Enter to exit", theme.muted())));
    lines
}

fn inset(area: Rect, horizontal: u16) -> Rect {
    Rect {
        x: area.x + horizontal.min(area.width / 2),
        width: area.width.saturating_sub(horizontal * 2),
        ..area
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::task::{ExecError, FailureReason};
    use ratatui::Terminal;
    use ratatui::backend::TestBackend;
    use std::path::PathBuf;

    fn plain_text(lines: &[Line<'_>]) -> Vec<String> {
        lines
            .iter()
            .map(|line| line.spans.iter().map(|span| span.content.as_ref()).collect())
            .collect()
    }

    fn names() -> Names {
        Names {
            host: "opencode".into(),
            agent: "cursor-agent".into(),
            provider_key: "cursor-acp".into(),
        }
    }

    fn state(step: Step) -> InstallerState {
        InstallerState {
            step,
            checks: vec![
                CheckResult::pass("opencode CLI", "1.0.0 (npm global)"),
                CheckResult::warn("cursor-agent", "not logged in"),
            ],
            tasks: Vec::new(),
            existing_setup: false,
            is_uninstall: false,
            plugin_link: PathBuf::from("/home/a/.config/opencode/plugin/cursor-acp.js"),
            config_path: PathBuf::from("/home/a/.config/opencode/opencode.json"),
        }
    }

    fn text(state: &InstallerState, agent_logged_in: bool) -> Vec<String> {
        let names = names();
        let screen = Screen {
            state,
            theme: &Theme::MONOCHROME,
            spinner_idx: 0,
            min_size: (80, 24),
            agent_logged_in,
            names: &names,
        };
        plain_text(&body_lines(&screen))
    }

    fn failed(name: &str, reason: FailureReason, optional: bool) -> Task {
        let mut task = Task::new(name, "...");
        if optional {
            task = task.optional();
        }
        task.start().unwrap();
        task.fail(
            ExecError::new(format!("{name} failed"), "", "exit status: 1", reason)
                .with_log_file(Some(PathBuf::from("/tmp/run.log"))),
        )
        .unwrap();
        task
    }

    #[test]
    fn welcome_lists_checks_in_order() {
        let lines = text(&state(Step::Welcome), true);
        let checks: Vec<&String> = lines.iter().filter(|l| l.starts_with("  [")).collect();
        assert_eq!(checks[0], "  [OK] opencode CLI: 1.0.0 (npm global)");
        assert_eq!(checks[1], "  [SKIP] cursor-agent: not logged in");
        assert!(lines.contains(&"Press Enter to install".to_string()));
    }

    #[test]
    fn welcome_blocks_on_hard_failure() {
        let mut s = state(Step::Welcome);
        s.checks.push(CheckResult::fail("Plugin source", "no package.json"));
        let lines = text(&s, true);
        assert!(lines.contains(&"Fix errors above before installing".to_string()));
        assert!(!lines.iter().any(|l| l.contains("Press Enter")));
    }

    #[test]
    fn existing_setup_offers_uninstall() {
        let mut s = state(Step::Welcome);
        s.existing_setup = true;
        let lines = text(&s, true);
        assert!(lines.contains(&"⚠ cursor-acp already configured".to_string()));
        assert!(lines.iter().any(|l| l.contains("Press 'u' to uninstall")));
        assert_eq!(help_text(&s), "Enter: Install  •  u: Uninstall  •  q: Quit");
    }

    #[test]
    fn failed_task_shows_details_and_hint() {
        let mut s = state(Step::Installing);
        s.tasks = vec![failed("Discover models", FailureReason::NoModelsFound, true)];
        let lines = text(&s, true);
        assert_eq!(lines[0], "[FAIL] Discover models (optional)");
        assert!(lines.contains(&"  └─ Error: Discover models failed".to_string()));
        assert!(lines.contains(&"  └─ See logs: /tmp/run.log".to_string()));
        assert!(lines.contains(
            &"  └─ Hint: Run with --debug to see raw cursor-agent output".to_string()
        ));
    }

    #[test]
    fn running_task_shows_description() {
        let mut s = state(Step::Installing);
        let mut task = Task::new("Build plugin", "Building plugin...");
        task.start().unwrap();
        s.tasks = vec![task, Task::new("Link plugin", "Linking...")];
        let lines = text(&s, true);
        assert_eq!(lines[0], "⠋ Building plugin...");
        assert_eq!(lines[1], "  Link plugin");
    }

    #[test]
    fn complete_success_with_login_reminder() {
        let mut s = state(Step::Complete);
        let mut task = Task::new("Build plugin", "Building plugin...");
        task.start().unwrap();
        task.complete().unwrap();
        s.tasks = vec![task];

        let lines = text(&s, false);
        assert_eq!(lines[0], "✓ Installation Complete");
        assert!(lines.contains(&"⚠ Remember to run: cursor-agent login".to_string()));
        assert!(
            lines.contains(&"Plugin:  /home/a/.config/opencode/plugin/cursor-acp.js".to_string())
        );
        assert!(!text(&s, true).iter().any(|l| l.contains("Remember")));
    }

    #[test]
    fn complete_failure_summary() {
        let mut s = state(Step::Complete);
        s.is_uninstall = true;
        s.tasks = vec![failed("Remove provider", FailureReason::InvalidConfig, false)];
        let lines = text(&s, true);
        assert_eq!(lines[0], "✗ Uninstallation Failed");
        assert!(lines.contains(&"[FAIL] Remove provider".to_string()));
        assert_eq!(lines.last().unwrap(), "Press Enter to exit");
    }

    fn rendered(width: u16, height: u16, state: &InstallerState) -> String {
        let names = names();
        let mut terminal = Terminal::new(TestBackend::new(width, height)).unwrap();
        terminal
            .draw(|frame| {
                draw(
                    frame,
                    &Screen {
                        state,
                        theme: &Theme::MONOCHROME,
                        spinner_idx: 0,
                        min_size: (80, 24),
                        agent_logged_in: true,
                        names: &names,
                    },
                )
            })
            .unwrap();
        terminal
            .backend()
            .buffer()
            .content()
            .iter()
            .map(|cell| cell.symbol())
            .collect()
    }

    #[test]
    fn undersized_terminal_only_shows_notice() {
        let screen = rendered(60, 20, &state(Step::Welcome));
        assert!(screen.contains("Terminal too small!"));
        assert!(screen.contains("Current: 60x20"));
        assert!(!screen.contains("Pre-install checks"));
    }

    #[test]
    fn full_frame_renders_checks_and_help() {
        let screen = rendered(100, 30, &state(Step::Welcome));
        assert!(screen.contains("Pre-install checks:"));
        assert!(screen.contains("[OK] opencode CLI"));
        assert!(screen.contains("Enter: Install"));
    }
}
