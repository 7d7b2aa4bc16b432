use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span, Text};
use ratatui::widgets::{Block, Borders, Clear, List, ListItem, Paragraph};
use ratatui::Frame;
use stagehand_core::ChangeKind;
use stagehand_mirror::{MirrorView, NoticeKind};

use super::app::{scroll_offset, scroll_offset_by_height, App, Input, Panel};

/// Render the full TUI frame.
pub fn render(f: &mut Frame, app: &App) {
    let view = MirrorView::project(&app.mirror);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1), // header
            Constraint::Min(5),    // panels
            Constraint::Length(3), // input
            Constraint::Length(1), // status bar
        ])
        .split(f.area());

    render_header(f, &view, chunks[0]);

    let panels = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Length(30), // tasks
            Constraint::Length(40), // staged / unstaged
            Constraint::Min(20),    // log
        ])
        .split(chunks[1]);
    let files = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(panels[1]);

    render_tasks(f, app, &view, panels[0]);
    render_files(f, app, &view, Panel::Staged, files[0]);
    render_files(f, app, &view, Panel::Unstaged, files[1]);
    render_log(f, app, &view, panels[2]);
    render_input(f, app, &view, chunks[2]);
    render_status_bar(f, app, &view, chunks[3]);

    if view.init_prompt {
        render_init_prompt(f, &view);
    } else if let Some(selected) = app.branch_picker {
        render_branch_picker(f, &view, selected);
    }
}

fn panel_style(app: &App, panel: Panel) -> Style {
    if app.active_panel == panel {
        Style::default().fg(Color::Cyan)
    } else {
        Style::default().fg(Color::DarkGray)
    }
}

fn row_style(app: &App, panel: Panel, index: usize) -> Style {
    if app.active_panel == panel && app.cursor(panel) == index {
        Style::default().add_modifier(Modifier::REVERSED)
    } else {
        Style::default()
    }
}

fn render_header(f: &mut Frame, view: &MirrorView, area: Rect) {
    let repo = if view.repo_label.is_empty() {
        "(no repository)".to_string()
    } else {
        view.repo_label.clone()
    };
    let branch = view.branch.as_deref().unwrap_or("-");
    let line = Line::from(vec![
        Span::styled(
            format!(" {repo} "),
            Style::default().fg(Color::Black).bg(Color::Cyan),
        ),
        Span::raw(format!("  branch: {branch}")),
        Span::styled(
            format!("  {}", view.repo_tooltip),
            Style::default().fg(Color::DarkGray),
        ),
    ]);
    f.render_widget(Paragraph::new(line), area);
}

fn render_tasks(f: &mut Frame, app: &App, view: &MirrorView, area: Rect) {
    let block = Block::default()
        .title(format!(" Tasks ({}) ", view.tasks.len()))
        .borders(Borders::ALL)
        .border_style(panel_style(app, Panel::Tasks));

    let height = area.height.saturating_sub(2) as usize;
    let offset = scroll_offset(app.cursor(Panel::Tasks), view.tasks.len(), height);
    let items: Vec<ListItem> = view
        .tasks
        .iter()
        .enumerate()
        .skip(offset)
        .map(|(i, task)| {
            let mark = if task.done { "[x]" } else { "[ ]" };
            ListItem::new(format!(" {mark} {}", task.name)).style(row_style(app, Panel::Tasks, i))
        })
        .collect();
    f.render_widget(List::new(items).block(block), area);
}

fn render_files(f: &mut Frame, app: &App, view: &MirrorView, panel: Panel, area: Rect) {
    let (title, rows) = match panel {
        Panel::Staged => ("Staged", &view.staged),
        _ => ("Unstaged", &view.unstaged),
    };
    let block = Block::default()
        .title(format!(" {title} ({}) ", rows.len()))
        .borders(Borders::ALL)
        .border_style(panel_style(app, panel));

    let height = area.height.saturating_sub(2) as usize;
    let offset = scroll_offset(app.cursor(panel), rows.len(), height);
    let items: Vec<ListItem> = rows
        .iter()
        .enumerate()
        .skip(offset)
        .map(|(i, row)| {
            let color = match row.change {
                Some(ChangeKind::Deleted) => Color::Red,
                Some(ChangeKind::Untracked) => Color::Green,
                Some(ChangeKind::Modified) => Color::Yellow,
                None => Color::Reset,
            };
            ListItem::new(Line::from(Span::styled(
                format!(" {}", row.label),
                Style::default().fg(color),
            )))
            .style(row_style(app, panel, i))
        })
        .collect();
    f.render_widget(List::new(items).block(block), area);
}

fn render_log(f: &mut Frame, app: &App, view: &MirrorView, area: Rect) {
    let block = Block::default()
        .title(format!(" Log ({}) ", view.log.len()))
        .borders(Borders::ALL)
        .border_style(panel_style(app, Panel::Log));

    let heights = view.commit_heights();
    let rows = area.height.saturating_sub(2) as usize;
    let offset = scroll_offset_by_height(&heights, app.cursor(Panel::Log), rows);
    let items: Vec<ListItem> = view
        .log
        .iter()
        .enumerate()
        .skip(offset)
        .map(|(i, commit)| {
            let mut lines = vec![Line::from(Span::styled(
                format!(" {}", commit.hash),
                Style::default().fg(Color::Yellow),
            ))];
            lines.extend(commit.lines.iter().map(|l| Line::from(format!("   {l}"))));
            lines.push(Line::default());
            ListItem::new(Text::from(lines)).style(row_style(app, Panel::Log, i))
        })
        .collect();
    f.render_widget(List::new(items).block(block), area);
}

fn render_input(f: &mut Frame, app: &App, view: &MirrorView, area: Rect) {
    let drafts = app.mirror.drafts();
    let (title, text) = match app.input {
        Some(Input::Task) => {
            let state = match (view.add_task.enabled, view.add_task.tooltip) {
                (_, Some(tip)) => tip.to_string(),
                (true, None) => "Enter to add".to_string(),
                (false, None) => "type a task name".to_string(),
            };
            (format!(" New task ({state}) "), drafts.task.as_str())
        }
        Some(Input::Commit) => {
            let state = if view.commit.enabled {
                "Enter to commit"
            } else if drafts.commit.is_empty() {
                "type a message"
            } else {
                "stage files first"
            };
            (format!(" Commit message ({state}) "), drafts.commit.as_str())
        }
        Some(Input::BranchName) => (
            " New branch name (Enter to create) ".to_string(),
            drafts.branch.as_str(),
        ),
        None => (" Input ".to_string(), ""),
    };
    let style = if app.input.is_some() {
        Style::default().fg(Color::Cyan)
    } else {
        Style::default().fg(Color::DarkGray)
    };
    let block = Block::default()
        .title(title)
        .borders(Borders::ALL)
        .border_style(style);
    f.render_widget(Paragraph::new(format!(" {text}")).block(block), area);
}

fn render_status_bar(f: &mut Frame, app: &App, view: &MirrorView, area: Rect) {
    let (text, style) = if let Some(notice) = &view.notice {
        let bg = match notice.kind {
            NoticeKind::BranchExists => Color::Yellow,
            NoticeKind::Error => Color::Red,
        };
        (
            format!(" {}  (Esc to dismiss)", notice.text),
            Style::default().fg(Color::Black).bg(bg),
        )
    } else if let Some(flash) = &app.flash {
        (
            format!(" {flash}"),
            Style::default().fg(Color::White).bg(Color::Magenta),
        )
    } else if app.engine_closed {
        (
            " engine disconnected | q:quit".to_string(),
            Style::default().fg(Color::White).bg(Color::Red),
        )
    } else if let Some(info) = &view.info {
        (
            format!(" {info}"),
            Style::default().fg(Color::White).bg(Color::Blue),
        )
    } else {
        let help = if app.input.is_some() {
            "Enter:submit  Esc:cancel"
        } else {
            "Tab:panel  j/k:move  Enter:toggle  t:task  c:commit  b:branch  R:revert  r:refresh  o:open  q:quit"
        };
        (
            format!(" stagehand | {help}"),
            Style::default().fg(Color::White).bg(Color::DarkGray),
        )
    };
    f.render_widget(Paragraph::new(Line::from(Span::styled(text, style))), area);
}

fn render_init_prompt(f: &mut Frame, view: &MirrorView) {
    let area = centered(f.area(), 50, 5);
    let block = Block::default()
        .title(" No repository ")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Yellow));
    let name = if view.repo_label.is_empty() {
        "this folder"
    } else {
        view.repo_label.as_str()
    };
    let text = format!("No repository in {name}.\ni: initialize   o: open another folder");
    f.render_widget(Clear, area);
    f.render_widget(
        Paragraph::new(text)
            .alignment(Alignment::Center)
            .block(block),
        area,
    );
}

fn render_branch_picker(f: &mut Frame, view: &MirrorView, selected: usize) {
    let height = (view.branches.len() as u16).saturating_add(2).min(f.area().height);
    let area = centered(f.area(), 40, height);
    let block = Block::default()
        .title(" Branch ")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan));
    let items: Vec<ListItem> = view
        .branches
        .iter()
        .enumerate()
        .map(|(i, row)| {
            let mark = if row.current { "*" } else { " " };
            let style = if i == selected {
                Style::default().add_modifier(Modifier::REVERSED)
            } else {
                Style::default()
            };
            ListItem::new(format!(" {mark} {}", row.option)).style(style)
        })
        .collect();
    f.render_widget(Clear, area);
    f.render_widget(List::new(items).block(block), area);
}

fn centered(area: Rect, width: u16, height: u16) -> Rect {
    let width = width.min(area.width);
    let height = height.min(area.height);
    Rect {
        x: area.x + (area.width - width) / 2,
        y: area.y + (area.height - height) / 2,
        width,
        height,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ratatui::backend::TestBackend;
    use ratatui::Terminal;
    use stagehand_bridge::RecordingService;
    use stagehand_core::protocol::{Batch, Notification};

    fn buffer_text(terminal: &Terminal<TestBackend>) -> String {
        terminal
            .backend()
            .buffer()
            .content()
            .iter()
            .map(|c| c.symbol())
            .collect()
    }

    #[test]
    fn centered_fits_inside() {
        let outer = Rect::new(0, 0, 100, 40);
        let r = centered(outer, 40, 10);
        assert_eq!(r, Rect::new(30, 15, 40, 10));
        let small = centered(Rect::new(0, 0, 20, 4), 40, 10);
        assert_eq!(small, Rect::new(0, 0, 20, 4));
    }

    #[test]
    fn renders_panels_and_files() {
        let svc = RecordingService::new();
        let mut app = App::new("ada".into());
        app.apply_notification(
            Notification::DirectoryUpdated {
                repo_name: Some("demo".into()),
                repo_path: "/demo".into(),
            },
            &svc,
        );
        app.apply_notification(
            Notification::StagedUpdated {
                batch: Batch::from_records(&["notes.txt"]),
            },
            &svc,
        );
        let mut terminal = Terminal::new(TestBackend::new(120, 30)).unwrap();
        terminal.draw(|f| render(f, &app)).unwrap();
        let text = buffer_text(&terminal);
        assert!(text.contains("demo"));
        assert!(text.contains("Staged (1)"));
        assert!(text.contains("notes.txt"));
        assert!(text.contains("Unstaged (0)"));
    }

    #[test]
    fn log_scrolls_to_commit_below_a_tall_one() {
        use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

        let svc = RecordingService::new();
        let mut app = App::new("ada".into());
        let tall: Vec<String> = (0..60).map(|i| format!("line {i}")).collect();
        let tall = format!("deadbeef\n{}", tall.join("\n"));
        app.apply_notification(
            Notification::LogUpdated {
                batch: Batch::from_records(&[tall.as_str(), "cafef00d\nshort"]),
            },
            &svc,
        );
        app.active_panel = Panel::Log;
        app.handle_key(KeyEvent::new(KeyCode::Down, KeyModifiers::empty()), &svc);
        assert_eq!(app.cursor(Panel::Log), 1);

        let mut terminal = Terminal::new(TestBackend::new(120, 30)).unwrap();
        terminal.draw(|f| render(f, &app)).unwrap();
        let text = buffer_text(&terminal);
        assert!(text.contains("cafef00d"));
        assert!(!text.contains("deadbeef"));
    }

    #[test]
    fn renders_init_prompt() {
        let svc = RecordingService::new();
        let mut app = App::new("ada".into());
        app.apply_notification(
            Notification::Error {
                message: "No VCS Directory Found".into(),
            },
            &svc,
        );
        let mut terminal = Terminal::new(TestBackend::new(120, 30)).unwrap();
        terminal.draw(|f| render(f, &app)).unwrap();
        assert!(buffer_text(&terminal).contains("No repository"));
    }
}
