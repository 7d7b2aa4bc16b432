//! Record codecs for engine notifications.
//!
//! Every list notification carries a *batch*: records concatenated as
//! `<byte-length>:<record>` items. [`decode_batch`] splits a batch back into
//! records; [`parse_file_record`] and [`parse_log_record`] turn individual
//! records into model entries.

use thiserror::Error;

use crate::types::{ChangeKind, CommitEntry, FileEntry, FileStatus};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DecodeError {
    #[error("missing ':' after length at byte {offset}")]
    MissingSeparator { offset: usize },
    #[error("invalid record length {text:?} at byte {offset}")]
    InvalidLength { offset: usize, text: String },
    #[error("record at byte {offset} claims {len} bytes but only {remaining} remain")]
    Truncated {
        offset: usize,
        len: usize,
        remaining: usize,
    },
    #[error("record at byte {offset} does not end on a character boundary")]
    SplitCharacter { offset: usize },
}

/// Split a batch into its records, in order.
pub fn decode_batch(batch: &str) -> Result<Vec<String>, DecodeError> {
    let mut records = Vec::new();
    let mut offset = 0;
    while offset < batch.len() {
        let rest = &batch[offset..];
        let colon = rest
            .find(':')
            .ok_or(DecodeError::MissingSeparator { offset })?;
        let len_text = &rest[..colon];
        if len_text.is_empty() || !len_text.bytes().all(|b| b.is_ascii_digit()) {
            return Err(DecodeError::InvalidLength {
                offset,
                text: len_text.to_string(),
            });
        }
        let len: usize = len_text.parse().map_err(|_| DecodeError::InvalidLength {
            offset,
            text: len_text.to_string(),
        })?;
        let start = offset + colon + 1;
        let remaining = batch.len() - start;
        if len > remaining {
            return Err(DecodeError::Truncated {
                offset,
                len,
                remaining,
            });
        }
        let end = start + len;
        if !batch.is_char_boundary(end) {
            return Err(DecodeError::SplitCharacter { offset });
        }
        records.push(batch[start..end].to_string());
        offset = end;
    }
    Ok(records)
}

/// Concatenate records into a batch. Inverse of [`decode_batch`].
pub fn encode_batch<S: AsRef<str>>(records: &[S]) -> String {
    let mut out = String::new();
    for record in records {
        let record = record.as_ref();
        out.push_str(&record.len().to_string());
        out.push(':');
        out.push_str(record);
    }
    out
}

/// Strip a known change-kind suffix from a file-status record.
pub fn split_change_suffix(record: &str) -> (&str, Option<ChangeKind>) {
    for kind in ChangeKind::ALL {
        if let Some(path) = record.strip_suffix(kind.suffix()) {
            return (path, Some(kind));
        }
    }
    (record, None)
}

/// Build a file entry from a file-status record.
pub fn parse_file_record(record: &str, status: FileStatus) -> FileEntry {
    let (path, change) = split_change_suffix(record);
    FileEntry {
        path: path.to_string(),
        label: record.to_string(),
        status,
        change,
    }
}

/// Build a commit entry from a `hash\nmessage` record.
///
/// A record without a line break has no hash; the whole text is the message.
pub fn parse_log_record(record: &str) -> CommitEntry {
    match record.split_once('\n') {
        Some((hash, message)) => CommitEntry {
            hash: hash.to_string(),
            message: message.to_string(),
        },
        None => CommitEntry {
            hash: String::new(),
            message: record.to_string(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_empty_batch() {
        assert_eq!(decode_batch("").unwrap(), Vec::<String>::new());
    }

    #[test]
    fn decode_records_in_order() {
        let records = decode_batch("5:a.txt18:src/lib.rs | (new)0:").unwrap();
        assert_eq!(records, vec!["a.txt", "src/lib.rs | (new)", ""]);
    }

    #[test]
    fn decode_record_containing_separators() {
        let batch = encode_batch(&["abc123\nFix: a 3:colon", "x"]);
        let records = decode_batch(&batch).unwrap();
        assert_eq!(records, vec!["abc123\nFix: a 3:colon", "x"]);
    }

    #[test]
    fn decode_multibyte_lengths_are_bytes() {
        let batch = encode_batch(&["héllo"]);
        assert!(batch.starts_with("6:"));
        assert_eq!(decode_batch(&batch).unwrap(), vec!["héllo"]);
    }

    #[test]
    fn decode_rejects_missing_separator() {
        assert_eq!(
            decode_batch("12"),
            Err(DecodeError::MissingSeparator { offset: 0 })
        );
    }

    #[test]
    fn decode_rejects_bad_length() {
        let err = decode_batch("1:ax:b").unwrap_err();
        assert_eq!(
            err,
            DecodeError::InvalidLength {
                offset: 3,
                text: "x".into()
            }
        );
    }

    #[test]
    fn decode_rejects_truncated_record() {
        let err = decode_batch("10:short").unwrap_err();
        assert_eq!(
            err,
            DecodeError::Truncated {
                offset: 0,
                len: 10,
                remaining: 5
            }
        );
    }

    #[test]
    fn decode_rejects_split_character() {
        // "é" is two bytes; a length of 1 cuts it in half.
        let err = decode_batch("1:é").unwrap_err();
        assert_eq!(err, DecodeError::SplitCharacter { offset: 0 });
    }

    #[test]
    fn file_record_suffixes() {
        let e = parse_file_record("a.txt | (modified)", FileStatus::Unstaged);
        assert_eq!(e.path, "a.txt");
        assert_eq!(e.label, "a.txt | (modified)");
        assert_eq!(e.change, Some(ChangeKind::Modified));

        let e = parse_file_record("gone.rs | (deleted)", FileStatus::Unstaged);
        assert_eq!(e.path, "gone.rs");
        assert_eq!(e.change, Some(ChangeKind::Deleted));

        let e = parse_file_record("new.md | (untracked)", FileStatus::Unstaged);
        assert_eq!(e.path, "new.md");
        assert_eq!(e.change, Some(ChangeKind::Untracked));
    }

    #[test]
    fn file_record_without_suffix_keeps_path() {
        let e = parse_file_record("dir/plain.txt", FileStatus::Staged);
        assert_eq!(e.path, "dir/plain.txt");
        assert_eq!(e.change, None);
        assert_eq!(e.status, FileStatus::Staged);
    }

    #[test]
    fn file_record_unknown_suffix_is_part_of_path() {
        let e = parse_file_record("odd | (renamed)", FileStatus::Unstaged);
        assert_eq!(e.path, "odd | (renamed)");
        assert_eq!(e.change, None);
    }

    #[test]
    fn log_record_splits_on_first_newline() {
        let c = parse_log_record("abc123\nFix bug\nSecond line");
        assert_eq!(c.hash, "abc123");
        assert_eq!(c.message, "Fix bug\nSecond line");
        assert_eq!(c.message_lines(), vec!["Fix bug", "Second line"]);
    }

    #[test]
    fn log_record_without_newline_has_empty_hash() {
        let c = parse_log_record("orphan message");
        assert_eq!(c.hash, "");
        assert_eq!(c.message, "orphan message");
    }
}
