//! Per-item comment threads.
//!
//! Threads are exactly two levels deep: root comments and their direct
//! replies. A reply to a reply, or to a system comment, is rejected.

use std::collections::HashMap;

use crate::error::{Result, ReviewError};
use crate::types::{ItemComment, OverallStatus};

pub const SYSTEM_AUTHOR_ID: &str = "system";
pub const SYSTEM_AUTHOR_NAME: &str = "System";

/// A root comment with its replies, borrowed from the store.
#[derive(Debug)]
pub struct Thread<'a> {
    pub root: &'a ItemComment,
    pub replies: Vec<&'a ItemComment>,
}

#[derive(Debug, Clone, Default)]
pub struct CommentStore {
    by_item: HashMap<String, Vec<ItemComment>>,
}

impl CommentStore {
    /// Rebuilds a store from `(item_id, comment)` pairs in insertion order.
    pub fn from_entries(entries: impl IntoIterator<Item = (String, ItemComment)>) -> Self {
        let mut by_item: HashMap<String, Vec<ItemComment>> = HashMap::new();
        for (item_id, comment) in entries {
            by_item.entry(item_id).or_default().push(comment);
        }
        Self { by_item }
    }

    pub fn comments(&self, item_id: &str) -> &[ItemComment] {
        self.by_item.get(item_id).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn count(&self, item_id: &str) -> usize {
        self.comments(item_id).len()
    }

    /// Appends `comment` as a leaf on `item_id`.
    pub fn add(&mut self, item_id: &str, comment: ItemComment) -> Result<&ItemComment> {
        if comment.text.trim().is_empty() {
            return Err(ReviewError::validation("Comment text cannot be empty"));
        }
        if let Some(parent_id) = comment.parent_id.as_deref() {
            let parent = self
                .comments(item_id)
                .iter()
                .find(|c| c.id == parent_id)
                .ok_or_else(|| ReviewError::not_found("comment", parent_id))?;
            if parent.parent_id.is_some() {
                return Err(ReviewError::validation("Replies cannot be replied to"));
            }
            if parent.is_system {
                return Err(ReviewError::validation("System comments cannot be replied to"));
            }
        }
        let thread = self.by_item.entry(item_id.to_owned()).or_default();
        thread.push(comment);
        Ok(&thread[thread.len() - 1])
    }

    /// Root comments of `item_id` with their direct replies, in insertion order.
    pub fn thread(&self, item_id: &str) -> Vec<Thread<'_>> {
        let comments = self.comments(item_id);
        comments
            .iter()
            .filter(|c| c.parent_id.is_none())
            .map(|root| Thread {
                root,
                replies: comments
                    .iter()
                    .filter(|c| c.parent_id.as_deref() == Some(root.id.as_str()))
                    .collect(),
            })
            .collect()
    }
}

/// Builds the synthetic comment recorded alongside a status change.
pub fn system_comment(text: String, status: OverallStatus, timestamp: i64) -> ItemComment {
    ItemComment {
        id: crate::new_id(),
        text,
        author_id: SYSTEM_AUTHOR_ID.to_owned(),
        author_name: SYSTEM_AUTHOR_NAME.to_owned(),
        timestamp,
        status_at_time: Some(status),
        is_system: true,
        parent_id: None,
        mentions: Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn comment(id: &str, parent: Option<&str>) -> ItemComment {
        ItemComment {
            id: id.to_owned(),
            text: format!("comment {id}"),
            author_id: "user-1".into(),
            author_name: "John Martinez".into(),
            timestamp: 0,
            status_at_time: None,
            is_system: false,
            parent_id: parent.map(str::to_owned),
            mentions: Vec::new(),
        }
    }

    #[test]
    fn threads_group_replies_under_roots() {
        let mut store = CommentStore::default();
        store.add("result-1", comment("a", None)).unwrap();
        store.add("result-1", comment("b", None)).unwrap();
        store.add("result-1", comment("a1", Some("a"))).unwrap();
        store.add("result-1", comment("a2", Some("a"))).unwrap();

        let thread = store.thread("result-1");
        assert_eq!(thread.len(), 2);
        assert_eq!(thread[0].root.id, "a");
        let replies: Vec<_> = thread[0].replies.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(replies, ["a1", "a2"]);
        assert!(thread[1].replies.is_empty());
        assert_eq!(store.count("result-1"), 4);
        assert_eq!(store.count("result-2"), 0);
    }

    #[test]
    fn reply_to_reply_is_rejected() {
        let mut store = CommentStore::default();
        store.add("result-1", comment("a", None)).unwrap();
        store.add("result-1", comment("a1", Some("a"))).unwrap();
        let err = store.add("result-1", comment("a11", Some("a1"))).unwrap_err();
        assert!(matches!(err, ReviewError::Validation(_)));
        assert_eq!(store.count("result-1"), 2);
    }

    #[test]
    fn reply_to_missing_or_system_parent_is_rejected() {
        let mut store = CommentStore::default();
        let err = store.add("result-1", comment("x", Some("ghost"))).unwrap_err();
        assert!(matches!(err, ReviewError::NotFound { kind: "comment", .. }));

        let sys = system_comment("Status changed".into(), OverallStatus::PreApproved, 0);
        let sys_id = sys.id.clone();
        store.add("result-1", sys).unwrap();
        assert!(store.add("result-1", comment("y", Some(&sys_id))).is_err());
    }

    #[test]
    fn blank_text_is_rejected() {
        let mut store = CommentStore::default();
        let mut blank = comment("a", None);
        blank.text = "   ".into();
        assert!(store.add("result-1", blank).is_err());
    }
}
