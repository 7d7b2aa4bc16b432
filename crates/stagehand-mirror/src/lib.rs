pub mod mirror;
pub mod tasks;
pub mod view;

pub use mirror::{Action, DraftField, Drafts, Event, Mirror, MirrorError, Notice, NoticeKind};
pub use tasks::TaskBook;
pub use view::MirrorView;
