//! `@First Last` mention extraction and completion.

use std::sync::LazyLock;

use regex::Regex;

use crate::types::{User, UserStatus};

static MENTION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"@(\w+\s\w+)").unwrap_or_else(|e| panic!("mention pattern: {e}"))
});

static MENTION_TRIGGER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"@(\w*)$").unwrap_or_else(|e| panic!("mention trigger pattern: {e}"))
});

/// Maximum suggestions offered while typing a mention.
pub const SUGGESTION_LIMIT: usize = 5;

/// Returns the ids of users whose `"First Last"` exactly matches an
/// `@First Last` fragment of `text`, in order of appearance.
///
/// Fragments that name no known user are dropped.
pub fn extract_mentions(text: &str, directory: &[User]) -> Vec<String> {
    MENTION
        .captures_iter(text)
        .filter_map(|caps| {
            let name = caps.get(1)?.as_str();
            directory
                .iter()
                .find(|user| user.display_name() == name)
                .map(|user| user.id.clone())
        })
        .collect()
}

/// The partial name typed after a trailing `@`, lowercased, if the text
/// currently ends in a mention trigger.
pub fn mention_query(text: &str) -> Option<String> {
    MENTION_TRIGGER
        .captures(text)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_lowercase())
}

/// Active users whose first or last name contains `query`.
pub fn suggestions<'a>(directory: &'a [User], query: &str) -> Vec<&'a User> {
    directory
        .iter()
        .filter(|user| user.status == UserStatus::Active)
        .filter(|user| {
            query.is_empty()
                || user.first_name.to_lowercase().contains(query)
                || user.last_name.to_lowercase().contains(query)
        })
        .take(SUGGESTION_LIMIT)
        .collect()
}

/// Replaces the trailing `@partial` of `text` with `@First Last `.
pub fn complete_mention(text: &str, user: &User) -> String {
    let start = text.rfind('@').unwrap_or(text.len());
    format!("{}@{} ", &text[..start], user.display_name())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::seed;

    #[test]
    fn extracts_only_known_full_names() {
        let users = seed::demo_users();
        let ids = extract_mentions(
            "@Sarah Chen please check with @Mike Johnson and @Nobody Here",
            &users,
        );
        assert_eq!(ids, vec!["user-2".to_owned(), "user-3".to_owned()]);
    }

    #[test]
    fn partial_name_is_not_a_mention() {
        let users = seed::demo_users();
        assert!(extract_mentions("thanks @Sarah", &users).is_empty());
        // Case matters: the directory name must match exactly.
        assert!(extract_mentions("@sarah chen", &users).is_empty());
    }

    #[test]
    fn trigger_query_and_completion() {
        let users = seed::demo_users();
        assert_eq!(mention_query("ask @Ro").as_deref(), Some("ro"));
        assert_eq!(mention_query("ask @").as_deref(), Some(""));
        assert_eq!(mention_query("ask Robert"), None);

        let found = suggestions(&users, "ro");
        assert_eq!(found.len(), 1);
        assert_eq!(complete_mention("ask @Ro", found[0]), "ask @Robert Wilson ");
    }

    #[test]
    fn suggestions_skip_inactive_users() {
        let users = seed::demo_users();
        // Emily Davis is Pending.
        assert!(suggestions(&users, "emily").is_empty());
        assert!(suggestions(&users, "").len() <= SUGGESTION_LIMIT);
    }
}
