use stagehand_core::TaskEntry;

use crate::mirror::MirrorError;

/// The active task list plus what changed locally since the last engine
/// snapshot.
///
/// `added` holds tasks created here and not marked done; `completed` holds
/// engine-reported tasks marked done. Both are reported with the next commit.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskBook {
    entries: Vec<TaskEntry>,
    added: Vec<String>,
    completed: Vec<String>,
}

impl TaskBook {
    /// Replace everything with an engine snapshot.
    pub fn replace(&mut self, records: Vec<String>) {
        self.entries = records.into_iter().map(TaskEntry::new).collect();
        self.added.clear();
        self.completed.clear();
    }

    pub fn clear(&mut self) {
        self.replace(Vec::new());
    }

    pub fn entries(&self) -> &[TaskEntry] {
        &self.entries
    }

    pub fn added(&self) -> &[String] {
        &self.added
    }

    pub fn completed(&self) -> &[String] {
        &self.completed
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.iter().any(|t| t.name == name)
    }

    /// Create a task locally. Names are unique and non-empty.
    pub fn add(&mut self, name: &str) -> Result<(), MirrorError> {
        if name.is_empty() {
            return Err(MirrorError::EmptyTaskName);
        }
        if self.contains(name) {
            return Err(MirrorError::DuplicateTask(name.to_string()));
        }
        self.entries.push(TaskEntry {
            name: name.to_string(),
            done: false,
            newly_added: true,
        });
        self.added.push(name.to_string());
        Ok(())
    }

    /// Flip a task's completion. Returns the new state.
    pub fn toggle(&mut self, name: &str) -> Result<bool, MirrorError> {
        let task = self
            .entries
            .iter_mut()
            .find(|t| t.name == name)
            .ok_or_else(|| MirrorError::UnknownTask(name.to_string()))?;
        task.done = !task.done;
        let (done, newly_added) = (task.done, task.newly_added);

        if done {
            if newly_added {
                remove(&mut self.added, name);
            } else {
                self.completed.push(name.to_string());
            }
        } else {
            remove(&mut self.completed, name);
            if newly_added {
                self.added.push(name.to_string());
            }
        }
        Ok(done)
    }
}

fn remove(list: &mut Vec<String>, name: &str) {
    if let Some(idx) = list.iter().position(|n| n == name) {
        list.remove(idx);
    }
}
