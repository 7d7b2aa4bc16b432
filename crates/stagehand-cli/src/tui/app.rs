use crossterm::event::{KeyCode, KeyEvent};
use stagehand_bridge::Service;
use stagehand_core::protocol::Notification;
use stagehand_core::{BranchOption, FileStatus};
use stagehand_mirror::{Action, DraftField, Event, Mirror};

/// Which panel is currently focused.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Panel {
    Tasks,
    Staged,
    Unstaged,
    Log,
}

impl Panel {
    pub fn next(self) -> Self {
        match self {
            Panel::Tasks => Panel::Staged,
            Panel::Staged => Panel::Unstaged,
            Panel::Unstaged => Panel::Log,
            Panel::Log => Panel::Tasks,
        }
    }

    pub fn prev(self) -> Self {
        match self {
            Panel::Tasks => Panel::Log,
            Panel::Staged => Panel::Tasks,
            Panel::Unstaged => Panel::Staged,
            Panel::Log => Panel::Unstaged,
        }
    }

    fn index(self) -> usize {
        match self {
            Panel::Tasks => 0,
            Panel::Staged => 1,
            Panel::Unstaged => 2,
            Panel::Log => 3,
        }
    }
}

/// Text input currently capturing keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Input {
    Task,
    Commit,
    BranchName,
}

impl Input {
    fn field(self) -> DraftField {
        match self {
            Input::Task => DraftField::Task,
            Input::Commit => DraftField::Commit,
            Input::BranchName => DraftField::Branch,
        }
    }
}

/// Application state for the TUI.
pub struct App {
    pub mirror: Mirror,
    pub author: String,
    pub should_quit: bool,
    pub active_panel: Panel,
    pub input: Option<Input>,
    /// Highlighted row of the open branch picker.
    pub branch_picker: Option<usize>,
    /// Why the last action was refused.
    pub flash: Option<String>,
    pub engine_closed: bool,
    cursors: [usize; 4],
}

impl App {
    pub fn new(author: String) -> Self {
        Self {
            mirror: Mirror::new(),
            author,
            should_quit: false,
            active_panel: Panel::Staged,
            input: None,
            branch_picker: None,
            flash: None,
            engine_closed: false,
            cursors: [0; 4],
        }
    }

    pub fn cursor(&self, panel: Panel) -> usize {
        self.cursors[panel.index()]
    }

    /// Apply an engine notification.
    pub fn apply_notification(&mut self, notification: Notification, service: &dyn Service) {
        self.dispatch(Event::Notification(notification), service);
    }

    /// Run one event through the mirror and forward its requests.
    fn dispatch(&mut self, event: Event, service: &dyn Service) -> bool {
        let accepted = match self.mirror.update(event) {
            Ok(requests) => {
                if let Err(e) = service.send_all(requests) {
                    tracing::warn!(error = %e, "failed to reach engine");
                    self.flash = Some(e.to_string());
                    self.engine_closed = true;
                }
                true
            }
            Err(e) => {
                tracing::debug!(error = %e, "event rejected");
                self.flash = Some(e.to_string());
                false
            }
        };
        self.clamp_cursors();
        accepted
    }

    fn act(&mut self, action: Action, service: &dyn Service) -> bool {
        self.flash = None;
        self.dispatch(Event::Action(action), service)
    }

    /// Handle a key press.
    pub fn handle_key(&mut self, key: KeyEvent, service: &dyn Service) {
        if let Some(input) = self.input {
            self.handle_input_key(input, key, service);
        } else if let Some(selected) = self.branch_picker {
            self.handle_picker_key(selected, key, service);
        } else {
            self.handle_normal_key(key, service);
        }
    }

    fn handle_normal_key(&mut self, key: KeyEvent, service: &dyn Service) {
        match key.code {
            KeyCode::Char('q') => self.should_quit = true,
            KeyCode::Esc => {
                if self.mirror.notice().is_some() {
                    self.act(Action::DismissNotice, service);
                } else {
                    self.flash = None;
                }
            }
            KeyCode::Tab => self.active_panel = self.active_panel.next(),
            KeyCode::BackTab => self.active_panel = self.active_panel.prev(),
            KeyCode::Char('j') | KeyCode::Down => self.move_cursor(1),
            KeyCode::Char('k') | KeyCode::Up => self.move_cursor(-1),
            KeyCode::Enter | KeyCode::Char(' ') => self.toggle_selected(service),
            KeyCode::Char('t') => self.input = Some(Input::Task),
            KeyCode::Char('c') => self.input = Some(Input::Commit),
            KeyCode::Char('b') => self.open_branch_picker(),
            KeyCode::Char('R') => self.revert_selected(service),
            KeyCode::Char('r') => {
                self.act(Action::Refresh, service);
            }
            KeyCode::Char('o') => {
                self.act(Action::SelectDirectory, service);
            }
            KeyCode::Char('i') if self.mirror.session().init_prompt => {
                self.act(Action::InitRepository, service);
            }
            _ => {}
        }
    }

    fn handle_input_key(&mut self, input: Input, key: KeyEvent, service: &dyn Service) {
        let field = input.field();
        match key.code {
            KeyCode::Esc => self.input = None,
            KeyCode::Enter => {
                let text = self.mirror.drafts().get(field).to_string();
                let action = match input {
                    Input::Task => Action::AddTask { name: text },
                    Input::Commit => Action::SubmitCommit {
                        message: text,
                        author: self.author.clone(),
                    },
                    Input::BranchName => Action::CreateBranch { name: text },
                };
                if self.act(action, service) {
                    self.input = None;
                }
            }
            KeyCode::Backspace => {
                let mut text = self.mirror.drafts().get(field).to_string();
                text.pop();
                self.act(Action::EditDraft { field, text }, service);
            }
            KeyCode::Char(ch) => {
                let mut text = self.mirror.drafts().get(field).to_string();
                text.push(ch);
                self.act(Action::EditDraft { field, text }, service);
            }
            _ => {}
        }
    }

    fn handle_picker_key(&mut self, selected: usize, key: KeyEvent, service: &dyn Service) {
        let options = self.mirror.branches().options();
        match key.code {
            KeyCode::Esc | KeyCode::Char('q') => self.branch_picker = None,
            KeyCode::Char('j') | KeyCode::Down => {
                self.branch_picker = Some((selected + 1).min(options.len().saturating_sub(1)));
            }
            KeyCode::Char('k') | KeyCode::Up => {
                self.branch_picker = Some(selected.saturating_sub(1));
            }
            KeyCode::Enter => {
                self.branch_picker = None;
                match options.get(selected) {
                    // Naming happens here rather than in the engine.
                    Some(BranchOption::CreateNew) => self.input = Some(Input::BranchName),
                    Some(option) => {
                        self.act(Action::SelectBranch(option.clone()), service);
                    }
                    None => {}
                }
            }
            _ => {}
        }
    }

    fn open_branch_picker(&mut self) {
        let branches = self.mirror.branches();
        let current = branches
            .current
            .as_deref()
            .and_then(|c| branches.names.iter().position(|n| n == c))
            .unwrap_or(0);
        self.branch_picker = Some(current);
    }

    fn toggle_selected(&mut self, service: &dyn Service) {
        let cursor = self.cursor(self.active_panel);
        let action = match self.active_panel {
            Panel::Tasks => self
                .mirror
                .tasks()
                .entries()
                .get(cursor)
                .map(|t| Action::ToggleTask {
                    name: t.name.clone(),
                }),
            Panel::Staged => self.file_action(FileStatus::Staged, cursor),
            Panel::Unstaged => self.file_action(FileStatus::Unstaged, cursor),
            Panel::Log => None,
        };
        if let Some(action) = action {
            self.act(action, service);
        }
    }

    fn file_action(&self, status: FileStatus, cursor: usize) -> Option<Action> {
        self.mirror
            .files(status)
            .get(cursor)
            .map(|f| Action::ToggleFile {
                status,
                path: f.path.clone(),
            })
    }

    fn revert_selected(&mut self, service: &dyn Service) {
        if self.active_panel != Panel::Log {
            return;
        }
        if let Some(commit) = self.mirror.log().get(self.cursor(Panel::Log)) {
            let hash = commit.hash.clone();
            self.act(Action::RevertCommit { hash }, service);
        }
    }

    fn panel_len(&self, panel: Panel) -> usize {
        match panel {
            Panel::Tasks => self.mirror.tasks().len(),
            Panel::Staged => self.mirror.staged().len(),
            Panel::Unstaged => self.mirror.unstaged().len(),
            Panel::Log => self.mirror.log().len(),
        }
    }

    fn move_cursor(&mut self, delta: isize) {
        let len = self.panel_len(self.active_panel);
        let cursor = &mut self.cursors[self.active_panel.index()];
        *cursor = if delta < 0 {
            cursor.saturating_sub(delta.unsigned_abs())
        } else {
            (*cursor + delta.unsigned_abs()).min(len.saturating_sub(1))
        };
    }

    /// Keep every cursor inside its list after the lists change.
    fn clamp_cursors(&mut self) {
        for panel in [Panel::Tasks, Panel::Staged, Panel::Unstaged, Panel::Log] {
            let len = self.panel_len(panel);
            let cursor = &mut self.cursors[panel.index()];
            *cursor = (*cursor).min(len.saturating_sub(1));
        }
    }
}

/// First visible row so that `cursor` stays inside a window of `height`
/// rows over `len` rows, never scrolling past the end of the content.
pub fn scroll_offset(cursor: usize, len: usize, height: usize) -> usize {
    if height == 0 || len <= height {
        return 0;
    }
    let max_offset = len - height;
    cursor.saturating_sub(height - 1).min(max_offset)
}

/// First visible item when items have different heights: the window ends at
/// `cursor` and reaches back as far as `rows` allows. An item taller than the
/// window is shown from its top.
pub fn scroll_offset_by_height(heights: &[usize], cursor: usize, rows: usize) -> usize {
    let Some(last) = heights.len().checked_sub(1) else {
        return 0;
    };
    let mut offset = cursor.min(last);
    let mut used = heights[offset];
    while offset > 0 && used + heights[offset - 1] <= rows {
        offset -= 1;
        used += heights[offset];
    }
    offset
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::KeyModifiers;
    use stagehand_bridge::RecordingService;
    use stagehand_core::protocol::{Batch, Request};

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::empty())
    }

    fn app_with(svc: &RecordingService) -> App {
        let mut app = App::new("ada".into());
        app.apply_notification(
            Notification::DirectoryUpdated {
                repo_name: Some("repo".into()),
                repo_path: "/repo".into(),
            },
            svc,
        );
        app.apply_notification(
            Notification::StagedUpdated {
                batch: Batch::from_records(&["s1", "s2"]),
            },
            svc,
        );
        app.apply_notification(
            Notification::UnstagedUpdated {
                batch: Batch::from_records(&["u1 | (modified)"]),
            },
            svc,
        );
        app.apply_notification(
            Notification::BranchesUpdated {
                batch: Batch::from_records(&["main", "dev"]),
            },
            svc,
        );
        app.apply_notification(
            Notification::LogUpdated {
                batch: Batch::from_records(&["h1\nfirst", "h2\nsecond"]),
            },
            svc,
        );
        svc.take();
        app
    }

    fn type_text(app: &mut App, svc: &RecordingService, text: &str) {
        for ch in text.chars() {
            app.handle_key(key(KeyCode::Char(ch)), svc);
        }
    }

    #[test]
    fn new_app_defaults() {
        let app = App::new("user".into());
        assert!(!app.should_quit);
        assert_eq!(app.active_panel, Panel::Staged);
        assert!(app.input.is_none());
        assert!(app.branch_picker.is_none());
    }

    #[test]
    fn panel_cycling() {
        assert_eq!(Panel::Tasks.next(), Panel::Staged);
        assert_eq!(Panel::Log.next(), Panel::Tasks);
        assert_eq!(Panel::Tasks.prev(), Panel::Log);
        assert_eq!(Panel::Unstaged.prev(), Panel::Staged);
    }

    #[test]
    fn quit_on_q() {
        let svc = RecordingService::new();
        let mut app = App::new("user".into());
        app.handle_key(key(KeyCode::Char('q')), &svc);
        assert!(app.should_quit);
    }

    #[test]
    fn enter_toggles_file_under_cursor() {
        let svc = RecordingService::new();
        let mut app = app_with(&svc);
        app.handle_key(key(KeyCode::Down), &svc);
        app.handle_key(key(KeyCode::Enter), &svc);
        assert_eq!(svc.take(), vec![Request::UnstageFile { path: "s2".into() }]);
        assert_eq!(app.mirror.staged().len(), 1);
        assert_eq!(app.mirror.unstaged().len(), 2);
        // Cursor clamped to the shorter list.
        assert_eq!(app.cursor(Panel::Staged), 0);
    }

    #[test]
    fn toggle_unstaged_uses_bare_path() {
        let svc = RecordingService::new();
        let mut app = app_with(&svc);
        app.handle_key(key(KeyCode::Tab), &svc);
        assert_eq!(app.active_panel, Panel::Unstaged);
        app.handle_key(key(KeyCode::Char(' ')), &svc);
        assert_eq!(svc.take(), vec![Request::StageFile { path: "u1".into() }]);
    }

    #[test]
    fn commit_input_submits_and_closes() {
        let svc = RecordingService::new();
        let mut app = app_with(&svc);
        app.handle_key(key(KeyCode::Char('c')), &svc);
        assert_eq!(app.input, Some(Input::Commit));
        type_text(&mut app, &svc, "fixx");
        app.handle_key(key(KeyCode::Backspace), &svc);
        assert_eq!(app.mirror.drafts().commit, "fix");
        app.handle_key(key(KeyCode::Enter), &svc);
        assert_eq!(
            svc.take(),
            vec![Request::Commit {
                message: "fix".into(),
                author: "ada".into(),
                completed_tasks: vec![],
                added_tasks: vec![],
            }]
        );
        assert!(app.input.is_none());
        assert!(app.mirror.staged().is_empty());
    }

    #[test]
    fn empty_commit_keeps_input_open_with_flash() {
        let svc = RecordingService::new();
        let mut app = app_with(&svc);
        app.handle_key(key(KeyCode::Char('c')), &svc);
        app.handle_key(key(KeyCode::Enter), &svc);
        assert!(svc.take().is_empty());
        assert_eq!(app.input, Some(Input::Commit));
        assert_eq!(app.flash.as_deref(), Some("commit message is empty"));
    }

    #[test]
    fn duplicate_task_rejected() {
        let svc = RecordingService::new();
        let mut app = app_with(&svc);
        for _ in 0..2 {
            app.handle_key(key(KeyCode::Char('t')), &svc);
            type_text(&mut app, &svc, "x");
            app.handle_key(key(KeyCode::Enter), &svc);
        }
        assert_eq!(app.mirror.tasks().len(), 1);
        assert_eq!(app.input, Some(Input::Task));
        assert!(app.flash.is_some());
    }

    #[test]
    fn branch_picker_checks_out() {
        let svc = RecordingService::new();
        let mut app = app_with(&svc);
        app.handle_key(key(KeyCode::Char('b')), &svc);
        assert_eq!(app.branch_picker, Some(0));
        app.handle_key(key(KeyCode::Down), &svc);
        app.handle_key(key(KeyCode::Enter), &svc);
        assert_eq!(svc.take(), vec![Request::CheckoutBranch { name: "dev".into() }]);
        assert!(app.branch_picker.is_none());
        assert!(app.mirror.staged().is_empty());
    }

    #[test]
    fn branch_picker_sentinel_opens_name_input() {
        let svc = RecordingService::new();
        let mut app = app_with(&svc);
        app.handle_key(key(KeyCode::Char('b')), &svc);
        for _ in 0..5 {
            app.handle_key(key(KeyCode::Down), &svc);
        }
        assert_eq!(app.branch_picker, Some(2));
        app.handle_key(key(KeyCode::Enter), &svc);
        assert_eq!(app.input, Some(Input::BranchName));
        type_text(&mut app, &svc, "feature");
        app.handle_key(key(KeyCode::Enter), &svc);
        assert_eq!(
            svc.take(),
            vec![Request::CreateBranch {
                name: Some("feature".into())
            }]
        );
        assert_eq!(app.mirror.drafts().branch, "feature");
    }

    #[test]
    fn revert_selected_commit() {
        let svc = RecordingService::new();
        let mut app = app_with(&svc);
        app.active_panel = Panel::Log;
        app.handle_key(key(KeyCode::Down), &svc);
        app.handle_key(key(KeyCode::Char('R')), &svc);
        assert_eq!(
            svc.take(),
            vec![
                Request::ResetToCommit { hash: "h2".into() },
                Request::RequestStatusRefresh,
                Request::RequestLog,
            ]
        );
        assert!(app.mirror.log().is_empty());
        assert_eq!(app.cursor(Panel::Log), 0);
    }

    #[test]
    fn init_key_only_when_prompted() {
        let svc = RecordingService::new();
        let mut app = app_with(&svc);
        app.handle_key(key(KeyCode::Char('i')), &svc);
        assert!(svc.take().is_empty());
        app.apply_notification(
            Notification::Error {
                message: "No VCS Directory Found".into(),
            },
            &svc,
        );
        app.handle_key(key(KeyCode::Char('i')), &svc);
        assert_eq!(
            svc.take(),
            vec![
                Request::InitRepository {
                    path: "/repo".into()
                },
                Request::SetWorkingDirectory {
                    path: "/repo".into()
                },
            ]
        );
    }

    #[test]
    fn esc_dismisses_notice() {
        let svc = RecordingService::new();
        let mut app = app_with(&svc);
        app.apply_notification(
            Notification::Error {
                message: "boom".into(),
            },
            &svc,
        );
        assert!(app.mirror.notice().is_some());
        app.handle_key(key(KeyCode::Esc), &svc);
        assert!(app.mirror.notice().is_none());
        assert!(!app.should_quit);
    }

    #[test]
    fn scroll_offset_keeps_cursor_visible() {
        assert_eq!(scroll_offset(0, 5, 10), 0);
        assert_eq!(scroll_offset(3, 20, 5), 0);
        assert_eq!(scroll_offset(4, 20, 5), 0);
        assert_eq!(scroll_offset(5, 20, 5), 1);
        assert_eq!(scroll_offset(19, 20, 5), 15);
        assert_eq!(scroll_offset(30, 20, 5), 15);
        assert_eq!(scroll_offset(3, 20, 0), 0);
    }

    #[test]
    fn height_offset_keeps_tall_items_visible() {
        assert_eq!(scroll_offset_by_height(&[], 3, 10), 0);
        // Everything fits.
        assert_eq!(scroll_offset_by_height(&[3, 3, 3], 2, 10), 0);
        // One tall commit above the cursor pushes the window down.
        assert_eq!(scroll_offset_by_height(&[3, 12, 3], 2, 10), 2);
        assert_eq!(scroll_offset_by_height(&[3, 3, 12, 3], 1, 10), 0);
        // Cursor item taller than the window still starts at the cursor.
        assert_eq!(scroll_offset_by_height(&[3, 20], 1, 10), 1);
        // Window smaller than any single item.
        assert_eq!(scroll_offset_by_height(&[4, 4, 4], 2, 2), 2);
        // Unit heights match the uniform helper.
        let ones = [1; 20];
        for cursor in 0..20 {
            assert_eq!(
                scroll_offset_by_height(&ones, cursor, 5),
                scroll_offset(cursor, 20, 5)
            );
        }
    }
}
