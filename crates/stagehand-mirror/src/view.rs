//! Pure projection of mirror state into what a front end draws.
//!
//! Nothing here holds UI handles; a front end rebuilds a [`MirrorView`] from
//! the [`Mirror`] whenever it redraws.

use stagehand_core::{BranchOption, ChangeKind, FileStatus};

use crate::mirror::{Mirror, Notice};

/// Repository names longer than this are shortened in the header.
pub const REPO_LABEL_MAX: usize = 20;
const REPO_LABEL_KEEP: usize = 17;

pub const TASK_EXISTS_TOOLTIP: &str = "Task Already Exists";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileRow {
    pub label: String,
    pub path: String,
    pub status: FileStatus,
    pub change: Option<ChangeKind>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskRow {
    pub name: String,
    pub done: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitRow {
    pub hash: String,
    pub lines: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BranchRow {
    pub option: BranchOption,
    pub current: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ButtonState {
    pub enabled: bool,
    pub tooltip: Option<&'static str>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MirrorView {
    pub repo_label: String,
    pub repo_tooltip: String,
    pub branch: Option<String>,
    pub staged: Vec<FileRow>,
    pub unstaged: Vec<FileRow>,
    pub tasks: Vec<TaskRow>,
    pub log: Vec<CommitRow>,
    pub branches: Vec<BranchRow>,
    pub add_task: ButtonState,
    pub commit: ButtonState,
    pub init_prompt: bool,
    pub notice: Option<Notice>,
    pub info: Option<String>,
}

impl MirrorView {
    pub fn project(mirror: &Mirror) -> Self {
        let session = mirror.session();
        let branches = mirror.branches();
        let drafts = mirror.drafts();

        let files = |status: FileStatus| -> Vec<FileRow> {
            mirror
                .files(status)
                .iter()
                .map(|f| FileRow {
                    label: f.label.clone(),
                    path: f.path.clone(),
                    status: f.status,
                    change: f.change,
                })
                .collect()
        };

        let add_task = ButtonState {
            enabled: mirror.can_add_task(),
            tooltip: mirror
                .tasks()
                .contains(&drafts.task)
                .then_some(TASK_EXISTS_TOOLTIP),
        };

        Self {
            repo_label: repo_label(&session.repo_name),
            repo_tooltip: format!("Directory: {}", session.repo_name),
            branch: branches.current.clone(),
            staged: files(FileStatus::Staged),
            unstaged: files(FileStatus::Unstaged),
            tasks: mirror
                .tasks()
                .entries()
                .iter()
                .map(|t| TaskRow {
                    name: t.name.clone(),
                    done: t.done,
                })
                .collect(),
            log: mirror
                .log()
                .iter()
                .map(|c| CommitRow {
                    hash: c.hash.clone(),
                    lines: c.message_lines().into_iter().map(String::from).collect(),
                })
                .collect(),
            branches: branches
                .options()
                .into_iter()
                .map(|option| {
                    let current = match &option {
                        BranchOption::Branch(name) => branches.is_current(name),
                        BranchOption::CreateNew => false,
                    };
                    BranchRow { option, current }
                })
                .collect(),
            add_task,
            commit: ButtonState {
                enabled: mirror.can_commit(),
                tooltip: None,
            },
            init_prompt: session.init_prompt,
            notice: mirror.notice().cloned(),
            info: mirror.info().map(String::from),
        }
    }

    /// Rows each commit occupies: hash line, message lines, blank separator.
    pub fn commit_heights(&self) -> Vec<usize> {
        self.log.iter().map(|c| c.lines.len() + 2).collect()
    }
}

/// Header label for a repository name, shortened past [`REPO_LABEL_MAX`].
pub fn repo_label(name: &str) -> String {
    if name.chars().count() <= REPO_LABEL_MAX {
        name.to_string()
    } else {
        let kept: String = name.chars().take(REPO_LABEL_KEEP).collect();
        format!("{kept}...")
    }
}
