//! Session identifiers.
//!
//! Callers that pick the lexicographically last recording as the most recent
//! one must name sessions with [`session_name`], whose fixed-width timestamp
//! makes string order match time order. Nothing here enforces that.

use crate::error::Result;
use crate::storage::LogStore;
use chrono::{DateTime, Utc};

/// Replaces every character outside `[A-Za-z0-9_-]` with `_`.
#[must_use]
pub fn sanitize_name(name: &str) -> String {
    name.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '_' || c == '-' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

/// `<prefix>_<epoch millis, zero-padded to 13 digits>`.
#[must_use]
pub fn session_name(prefix: &str, now: DateTime<Utc>) -> String {
    let millis = now.timestamp_millis().max(0);
    format!("{}_{:013}", sanitize_name(prefix), millis)
}

/// Lexicographically last stored recording.
pub fn latest_recording<S: LogStore + ?Sized>(store: &S) -> Result<Option<String>> {
    let names = store.list_recordings()?;
    Ok(names.into_iter().max())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryLogStore;
    use chrono::TimeZone;

    #[test]
    fn test_sanitize() {
        assert_eq!(sanitize_name("battle_1-a"), "battle_1-a");
        assert_eq!(sanitize_name("a b/c.d"), "a_b_c_d");
        assert_eq!(sanitize_name("é"), "_");
    }

    #[test]
    fn test_session_name_is_fixed_width() {
        let early = Utc.timestamp_millis_opt(5).unwrap();
        let late = Utc.timestamp_millis_opt(1_700_000_000_000).unwrap();
        assert_eq!(session_name("battle", early), "battle_0000000000005");
        assert_eq!(session_name("battle", late), "battle_1700000000000");
        assert!(session_name("battle", early) < session_name("battle", late));
    }

    #[test]
    fn test_latest_recording() {
        let store = MemoryLogStore::new();
        assert_eq!(latest_recording(&store).unwrap(), None);
        store.insert("battle_0000000000100", vec![]);
        store.insert("battle_0000000000020", vec![]);
        assert_eq!(
            latest_recording(&store).unwrap().as_deref(),
            Some("battle_0000000000100.jsonl")
        );
    }
}
