/// Label shown for the synthetic "create new branch" option.
pub const CREATE_BRANCH_LABEL: &str = "Create New Branch";

/// Which file list an entry belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FileStatus {
    Staged,
    Unstaged,
}

impl FileStatus {
    /// The list a toggled entry moves to.
    pub fn opposite(self) -> Self {
        match self {
            FileStatus::Staged => FileStatus::Unstaged,
            FileStatus::Unstaged => FileStatus::Staged,
        }
    }
}

/// Change annotation carried as a suffix on a file-status record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    Deleted,
    Modified,
    Untracked,
}

impl ChangeKind {
    pub const ALL: [ChangeKind; 3] = [
        ChangeKind::Deleted,
        ChangeKind::Modified,
        ChangeKind::Untracked,
    ];

    /// Record suffix, including the leading separator.
    pub fn suffix(self) -> &'static str {
        match self {
            ChangeKind::Deleted => " | (deleted)",
            ChangeKind::Modified => " | (modified)",
            ChangeKind::Untracked => " | (untracked)",
        }
    }
}

/// A file reported by the engine as staged or unstaged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileEntry {
    /// Bare path, suffix stripped. Sent back to the engine on toggle.
    pub path: String,
    /// Record text exactly as received.
    pub label: String,
    pub status: FileStatus,
    pub change: Option<ChangeKind>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskEntry {
    pub name: String,
    pub done: bool,
    /// Created locally this session rather than reported by the engine.
    pub newly_added: bool,
}

impl TaskEntry {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            done: false,
            newly_added: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitEntry {
    pub hash: String,
    pub message: String,
}

impl CommitEntry {
    /// Message split into visual lines.
    pub fn message_lines(&self) -> Vec<&str> {
        self.message.lines().collect()
    }
}

/// One entry of the branch dropdown.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BranchOption {
    Branch(String),
    /// The "create new branch" affordance. Never a real branch name.
    CreateNew,
}

impl BranchOption {
    pub fn label(&self) -> &str {
        match self {
            BranchOption::Branch(name) => name,
            BranchOption::CreateNew => CREATE_BRANCH_LABEL,
        }
    }
}

impl std::fmt::Display for BranchOption {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Known branches plus the one checked out.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BranchSet {
    pub names: Vec<String>,
    pub current: Option<String>,
}

impl BranchSet {
    /// Build from an engine batch. The first record is the current branch.
    pub fn from_records(records: Vec<String>) -> Self {
        let current = records.first().cloned();
        Self {
            names: records,
            current,
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.iter().any(|n| n == name)
    }

    pub fn is_current(&self, name: &str) -> bool {
        self.current.as_deref() == Some(name)
    }

    /// Dropdown options: every branch in order, then the sentinel.
    pub fn options(&self) -> Vec<BranchOption> {
        self.names
            .iter()
            .cloned()
            .map(BranchOption::Branch)
            .chain(std::iter::once(BranchOption::CreateNew))
            .collect()
    }
}

/// Which repository the mirror is currently showing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Session {
    pub repo_name: String,
    pub repo_path: String,
    /// A valid repository root is active.
    pub found_dir: bool,
    pub init_prompt: bool,
}
