//! Line-level diff statistics between two content strings, computed with a
//! sequence matcher over line lists. Used by the history UI payload and by
//! the auto-execute engine's delta-vs-full decision.

use similar::{ChangeTag, TextDiff};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DiffStats {
    pub lines_added: usize,
    pub lines_removed: usize,
    pub lines_unchanged: usize,
}

impl DiffStats {
    pub fn total_changed(&self) -> usize {
        self.lines_added + self.lines_removed
    }
}

pub fn diff_stats(before: &str, after: &str) -> DiffStats {
    let diff = TextDiff::from_lines(before, after);
    let mut stats = DiffStats::default();
    for change in diff.iter_all_changes() {
        match change.tag() {
            ChangeTag::Insert => stats.lines_added += 1,
            ChangeTag::Delete => stats.lines_removed += 1,
            ChangeTag::Equal => stats.lines_unchanged += 1,
        }
    }
    stats
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identical_content_has_no_changes() {
        let stats = diff_stats("a\nb\nc", "a\nb\nc");
        assert_eq!(stats.lines_added, 0);
        assert_eq!(stats.lines_removed, 0);
        assert_eq!(stats.lines_unchanged, 3);
    }

    #[test]
    fn counts_additions_and_removals() {
        let stats = diff_stats("a\nb\nc", "a\nx\nc\nd");
        assert_eq!(stats.lines_removed, 1);
        assert_eq!(stats.lines_added, 2);
        assert_eq!(stats.lines_unchanged, 2);
    }
}
