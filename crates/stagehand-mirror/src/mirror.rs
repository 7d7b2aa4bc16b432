//! The working-set mirror.
//!
//! Holds the client-side copy of the engine's state and applies every change
//! through [`Mirror::update`]. Inbound notifications replace a collection
//! wholesale; user actions mutate local state optimistically and return the
//! requests that tell the engine what happened. Optimistic state is
//! reconciled at the next refresh notification of the same collection.

use stagehand_core::protocol::{classify_error, EngineError, Notification, Request};
use stagehand_core::record::{parse_file_record, parse_log_record, DecodeError};
use stagehand_core::{BranchOption, BranchSet, CommitEntry, FileEntry, FileStatus, Session};
use thiserror::Error;

use crate::tasks::TaskBook;

/// Text of the notice shown when a branch name is taken.
pub const BRANCH_EXISTS_NOTICE: &str =
    "A branch with that name already exists, please choose a different name";

/// Why an event was not applied. A rejected event changes nothing.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum MirrorError {
    #[error("malformed {kind} batch: {source}")]
    Decode {
        kind: &'static str,
        #[source]
        source: DecodeError,
    },
    #[error("task name is empty")]
    EmptyTaskName,
    #[error("task already exists: {0}")]
    DuplicateTask(String),
    #[error("no such task: {0}")]
    UnknownTask(String),
    #[error("commit message is empty")]
    EmptyCommitMessage,
    #[error("no staged files to commit")]
    NothingStaged,
    #[error("no {status:?} file at {path}")]
    UnknownFile { status: FileStatus, path: String },
    #[error("no commit {0} in the log")]
    UnknownCommit(String),
    #[error("no such branch: {0}")]
    UnknownBranch(String),
    #[error("branch name is empty")]
    EmptyBranchName,
    #[error("branch already exists: {0}")]
    BranchExists(String),
}

/// Text inputs edited by the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DraftField {
    Task,
    Commit,
    Branch,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Drafts {
    pub task: String,
    pub commit: String,
    pub branch: String,
}

impl Drafts {
    pub fn get(&self, field: DraftField) -> &str {
        match field {
            DraftField::Task => &self.task,
            DraftField::Commit => &self.commit,
            DraftField::Branch => &self.branch,
        }
    }

    fn get_mut(&mut self, field: DraftField) -> &mut String {
        match field {
            DraftField::Task => &mut self.task,
            DraftField::Commit => &mut self.commit,
            DraftField::Branch => &mut self.branch,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    BranchExists,
    Error,
}

/// A message waiting for the user to dismiss it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub kind: NoticeKind,
    pub text: String,
}

/// Something the user did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    ToggleFile { status: FileStatus, path: String },
    ToggleTask { name: String },
    AddTask { name: String },
    SubmitCommit { message: String, author: String },
    RevertCommit { hash: String },
    SelectBranch(BranchOption),
    CreateBranch { name: String },
    SelectDirectory,
    InitRepository,
    Refresh,
    EditDraft { field: DraftField, text: String },
    DismissNotice,
}

/// Input to [`Mirror::update`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    Notification(Notification),
    Action(Action),
}

impl From<Notification> for Event {
    fn from(n: Notification) -> Self {
        Event::Notification(n)
    }
}

impl From<Action> for Event {
    fn from(a: Action) -> Self {
        Event::Action(a)
    }
}

#[derive(Debug, Clone, Default)]
pub struct Mirror {
    session: Session,
    staged: Vec<FileEntry>,
    unstaged: Vec<FileEntry>,
    tasks: TaskBook,
    log: Vec<CommitEntry>,
    branches: BranchSet,
    drafts: Drafts,
    /// Name sent in the last create-branch request, until a refresh lists it.
    pending_branch: Option<String>,
    notice: Option<Notice>,
    info: Option<String>,
}

impl Mirror {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply one event and return the requests to forward to the engine.
    pub fn update(&mut self, event: impl Into<Event>) -> Result<Vec<Request>, MirrorError> {
        match event.into() {
            Event::Notification(n) => self.apply_notification(n),
            Event::Action(a) => self.apply_action(a),
        }
    }

    fn apply_notification(&mut self, n: Notification) -> Result<Vec<Request>, MirrorError> {
        let kind = n.kind();
        tracing::debug!(kind, "applying notification");
        let decode = |batch: &stagehand_core::protocol::Batch| {
            batch
                .decode()
                .map_err(|source| {
                    tracing::warn!(kind, error = %source, "dropping malformed batch");
                    MirrorError::Decode { kind, source }
                })
        };
        match n {
            Notification::BranchesUpdated { batch } => self.refresh_branches(decode(&batch)?),
            Notification::StagedUpdated { batch } => self.refresh_staged(decode(&batch)?),
            Notification::UnstagedUpdated { batch } => self.refresh_unstaged(decode(&batch)?),
            Notification::TasksUpdated { batch } => self.refresh_tasks(decode(&batch)?),
            Notification::LogUpdated { batch } => self.refresh_log(decode(&batch)?),
            Notification::DirectoryUpdated {
                repo_name,
                repo_path,
            } => return Ok(self.refresh_directory(repo_name.as_deref(), &repo_path)),
            Notification::Error { message } => self.engine_error(&message),
            Notification::Info { message } => {
                tracing::info!(%message, "engine");
                self.info = Some(message);
            }
        }
        Ok(Vec::new())
    }

    fn apply_action(&mut self, a: Action) -> Result<Vec<Request>, MirrorError> {
        tracing::debug!(action = ?a, "applying action");
        match a {
            Action::ToggleFile { status, path } => self.toggle_file_stage(status, &path),
            Action::ToggleTask { name } => {
                self.tasks.toggle(&name)?;
                Ok(Vec::new())
            }
            Action::AddTask { name } => self.add_task(&name),
            Action::SubmitCommit { message, author } => self.submit_commit(&message, &author),
            Action::RevertCommit { hash } => self.revert_commit(&hash),
            Action::SelectBranch(option) => self.change_branch(&option),
            Action::CreateBranch { name } => self.create_branch(&name),
            Action::SelectDirectory => Ok(vec![Request::SelectFolder]),
            Action::InitRepository => Ok(self.init_repository()),
            Action::Refresh => Ok(vec![Request::RequestStatusRefresh]),
            Action::EditDraft { field, text } => {
                *self.drafts.get_mut(field) = text;
                Ok(Vec::new())
            }
            Action::DismissNotice => {
                self.notice = None;
                Ok(Vec::new())
            }
        }
    }

    // ── Refreshes ──

    pub fn refresh_staged(&mut self, records: Vec<String>) {
        self.staged = files_from(records, FileStatus::Staged);
    }

    pub fn refresh_unstaged(&mut self, records: Vec<String>) {
        self.unstaged = files_from(records, FileStatus::Unstaged);
    }

    pub fn refresh_tasks(&mut self, records: Vec<String>) {
        self.tasks.replace(records);
    }

    pub fn refresh_log(&mut self, records: Vec<String>) {
        self.log = records.iter().map(|r| parse_log_record(r)).collect();
    }

    pub fn refresh_branches(&mut self, records: Vec<String>) {
        self.branches = BranchSet::from_records(records);
        let Some(pending) = self.pending_branch.take() else {
            return;
        };
        if !self.branches.contains(&pending) {
            self.pending_branch = Some(pending);
        } else if self.drafts.branch == pending {
            self.drafts.branch.clear();
        }
    }

    /// Switch repositories when the engine reports a new, non-empty name.
    pub fn refresh_directory(&mut self, repo_name: Option<&str>, repo_path: &str) -> Vec<Request> {
        let Some(name) = repo_name.filter(|n| !n.is_empty()) else {
            return Vec::new();
        };
        if name == self.session.repo_name {
            return Vec::new();
        }
        tracing::info!(repo = name, path = repo_path, "switching repository");
        self.reset();
        self.session = Session {
            repo_name: name.to_string(),
            repo_path: repo_path.to_string(),
            found_dir: true,
            init_prompt: false,
        };
        vec![Request::SetWorkingDirectory {
            path: repo_path.to_string(),
        }]
    }

    fn engine_error(&mut self, message: &str) {
        match classify_error(message) {
            EngineError::NoRepository => {
                self.session.init_prompt = true;
                self.session.found_dir = false;
            }
            EngineError::BranchExists => {
                self.notice = Some(Notice {
                    kind: NoticeKind::BranchExists,
                    text: BRANCH_EXISTS_NOTICE.to_string(),
                });
            }
            EngineError::Other(message) => {
                tracing::warn!(%message, "engine error");
                self.notice = Some(Notice {
                    kind: NoticeKind::Error,
                    text: format!("ERROR: {message}"),
                });
            }
        }
    }

    fn reset(&mut self) {
        *self = Mirror {
            info: self.info.take(),
            ..Mirror::default()
        };
    }

    // ── User operations ──

    /// Move a file to the other list and tell the engine.
    pub fn toggle_file_stage(
        &mut self,
        status: FileStatus,
        path: &str,
    ) -> Result<Vec<Request>, MirrorError> {
        let (from, to) = match status {
            FileStatus::Staged => (&mut self.staged, &mut self.unstaged),
            FileStatus::Unstaged => (&mut self.unstaged, &mut self.staged),
        };
        let idx = from
            .iter()
            .position(|f| f.path == path)
            .ok_or_else(|| MirrorError::UnknownFile {
                status,
                path: path.to_string(),
            })?;
        let mut entry = from.remove(idx);
        entry.status = status.opposite();
        to.push(entry);

        let path = path.to_string();
        Ok(vec![match status {
            FileStatus::Staged => Request::UnstageFile { path },
            FileStatus::Unstaged => Request::StageFile { path },
        }])
    }

    pub fn add_task(&mut self, name: &str) -> Result<Vec<Request>, MirrorError> {
        self.tasks.add(name)?;
        self.drafts.task.clear();
        Ok(Vec::new())
    }

    pub fn submit_commit(&mut self, message: &str, author: &str) -> Result<Vec<Request>, MirrorError> {
        if message.is_empty() {
            return Err(MirrorError::EmptyCommitMessage);
        }
        if self.staged.is_empty() {
            return Err(MirrorError::NothingStaged);
        }
        let request = Request::Commit {
            message: message.to_string(),
            author: author.to_string(),
            completed_tasks: self.tasks.completed().to_vec(),
            added_tasks: self.tasks.added().to_vec(),
        };
        self.staged.clear();
        self.drafts.commit.clear();
        Ok(vec![request])
    }

    /// Reset to a commit, then reload log and status from the engine.
    pub fn revert_commit(&mut self, hash: &str) -> Result<Vec<Request>, MirrorError> {
        if !self.log.iter().any(|c| c.hash == hash) {
            return Err(MirrorError::UnknownCommit(hash.to_string()));
        }
        self.log.clear();
        Ok(vec![
            Request::ResetToCommit {
                hash: hash.to_string(),
            },
            Request::RequestStatusRefresh,
            Request::RequestLog,
        ])
    }

    /// Check out another branch. The sentinel asks the engine to create one.
    pub fn change_branch(&mut self, option: &BranchOption) -> Result<Vec<Request>, MirrorError> {
        let name = match option {
            BranchOption::CreateNew => return Ok(vec![Request::CreateBranch { name: None }]),
            BranchOption::Branch(name) => name,
        };
        if self.branches.is_current(name) {
            return Ok(Vec::new());
        }
        if !self.branches.contains(name) {
            return Err(MirrorError::UnknownBranch(name.clone()));
        }
        self.branches.current = Some(name.clone());
        // The new branch's status arrives with the next refresh.
        self.staged.clear();
        self.unstaged.clear();
        self.tasks.clear();
        self.log.clear();
        Ok(vec![Request::CheckoutBranch { name: name.clone() }])
    }

    /// Ask the engine to create a named branch. The draft is kept until the
    /// requested branch shows up in a refresh, so a name conflict can be
    /// corrected.
    pub fn create_branch(&mut self, name: &str) -> Result<Vec<Request>, MirrorError> {
        if name.is_empty() {
            return Err(MirrorError::EmptyBranchName);
        }
        if self.branches.contains(name) {
            return Err(MirrorError::BranchExists(name.to_string()));
        }
        self.pending_branch = Some(name.to_string());
        Ok(vec![Request::CreateBranch {
            name: Some(name.to_string()),
        }])
    }

    pub fn init_repository(&mut self) -> Vec<Request> {
        self.session.init_prompt = false;
        let path = self.session.repo_path.clone();
        vec![
            Request::InitRepository { path: path.clone() },
            Request::SetWorkingDirectory { path },
        ]
    }

    // ── Accessors ──

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn staged(&self) -> &[FileEntry] {
        &self.staged
    }

    pub fn unstaged(&self) -> &[FileEntry] {
        &self.unstaged
    }

    pub fn files(&self, status: FileStatus) -> &[FileEntry] {
        match status {
            FileStatus::Staged => &self.staged,
            FileStatus::Unstaged => &self.unstaged,
        }
    }

    pub fn tasks(&self) -> &TaskBook {
        &self.tasks
    }

    pub fn log(&self) -> &[CommitEntry] {
        &self.log
    }

    pub fn branches(&self) -> &BranchSet {
        &self.branches
    }

    pub fn drafts(&self) -> &Drafts {
        &self.drafts
    }

    pub fn notice(&self) -> Option<&Notice> {
        self.notice.as_ref()
    }

    pub fn info(&self) -> Option<&str> {
        self.info.as_deref()
    }

    /// Whether submitting the current commit draft would be accepted.
    pub fn can_commit(&self) -> bool {
        !self.drafts.commit.is_empty() && !self.staged.is_empty()
    }

    /// Whether adding the current task draft would be accepted.
    pub fn can_add_task(&self) -> bool {
        !self.drafts.task.is_empty() && !self.tasks.contains(&self.drafts.task)
    }
}

fn files_from(records: Vec<String>, status: FileStatus) -> Vec<FileEntry> {
    records
        .iter()
        .map(|r| parse_file_record(r, status))
        .collect()
}
