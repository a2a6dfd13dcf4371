//! Revert Engine: undo a rejected or superseded tool execution by
//! inverting its recorded op, per the per-tool-type table.
//!
//! `file_edit` reverts need the original call's `find_text`/`replace_text`
//! or `start_line`/`end_line`, which `ToolOp` doesn't carry — keeping
//! history's trimmed ops free of mode metadata means callers reach for
//! [`revert_find_replace_edit`] or [`revert_line_range_edit`] directly
//! using the proposal's `resolved_params`, rather than going through a
//! generic dispatch.

use agentkit_error::CoreError;
use agentkit_tools::{invert_find_replace, reconstruct_line_range};
use agentkit_types::ToolOp;

/// Revert a `file.write`: if the file didn't exist before, revert means
/// the file should be deleted (signalled by `None`); if it existed,
/// revert restores the prior content.
pub fn revert_file_write(op: &ToolOp) -> Option<&str> {
    op.before.as_deref()
}

/// Revert a `file.move`: the file moves back from `op.path` (the
/// destination) to the original path, captured in `op.before`.
pub fn revert_file_move_target(op: &ToolOp) -> Option<&str> {
    op.before.as_deref()
}

/// Revert a `find_replace` `file.edit`: substitute `replace_text` back to
/// `find_text` against the file's current on-disk content, so a concurrent
/// edit made outside the touched region survives the revert. Falls back to
/// the captured `before` snapshot if `replace_text` is no longer present.
pub fn revert_find_replace_edit(
    op: &ToolOp,
    current_on_disk: &str,
    find_text: &str,
    replace_text: &str,
    replace_all: bool,
) -> Result<String, CoreError> {
    let before = captured_before(op)?;
    Ok(invert_find_replace(current_on_disk, find_text, replace_text, replace_all)
        .unwrap_or_else(|| before.to_string()))
}

/// Revert a `line_range` `file.edit`: reconstruct the touched span from the
/// `before` snapshot while keeping whatever the file now holds outside it.
pub fn revert_line_range_edit(
    op: &ToolOp,
    current_on_disk: &str,
    start_line: usize,
    end_line: usize,
) -> Result<String, CoreError> {
    let before = captured_before(op)?;
    Ok(reconstruct_line_range(before, current_on_disk, start_line, end_line))
}

fn captured_before(op: &ToolOp) -> Result<&str, CoreError> {
    op.before.as_deref().ok_or_else(|| CoreError::ToolExecution {
        message: format!("{} op missing captured 'before' content; cannot revert", op.op_type),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn op(op_type: &str, path: &str, before: Option<&str>) -> ToolOp {
        ToolOp {
            op_type: op_type.into(),
            path: Some(path.into()),
            before: before.map(str::to_string),
            after: None,
            before_checkpoint_id: None,
            after_checkpoint_id: None,
            before_checkpoint_created: false,
            after_checkpoint_created: false,
            pre_executed: false,
        }
    }

    #[test]
    fn reverting_file_write_restores_prior_content() {
        let write_op = op("file_write", "a.txt", Some("old content"));
        assert_eq!(revert_file_write(&write_op), Some("old content"));
    }

    #[test]
    fn reverting_file_write_that_created_a_new_file_yields_none() {
        let write_op = op("file_write", "a.txt", None);
        assert_eq!(revert_file_write(&write_op), None);
    }

    #[test]
    fn find_replace_edit_inverts_against_live_content() {
        let edit_op = op("file_edit", "a.txt", Some("foo bar foo"));
        let reverted = revert_find_replace_edit(&edit_op, "baz bar baz", "foo", "baz", true).unwrap();
        assert_eq!(reverted, "foo bar foo");
    }

    #[test]
    fn find_replace_edit_falls_back_to_snapshot_when_pattern_gone() {
        let edit_op = op("file_edit", "a.txt", Some("foo bar foo"));
        let reverted =
            revert_find_replace_edit(&edit_op, "everything rewritten", "foo", "baz", true).unwrap();
        assert_eq!(reverted, "foo bar foo");
    }

    #[test]
    fn line_range_edit_preserves_concurrent_trailing_edit() {
        let edit_op = op("file_edit", "a.txt", Some("a\nb\nc\nd"));
        let reverted = revert_line_range_edit(&edit_op, "a\nX\nd\ne", 2, 3).unwrap();
        assert_eq!(reverted, "a\nb\nc\nd\ne");
    }

    #[test]
    fn file_move_revert_reads_original_path_from_before() {
        let move_op = op("file_move", "dest.txt", Some("src.txt"));
        assert_eq!(revert_file_move_target(&move_op), Some("src.txt"));
    }

    #[test]
    fn missing_before_snapshot_is_a_revert_error() {
        let edit_op = op("file_edit", "a.txt", None);
        assert!(revert_find_replace_edit(&edit_op, "x", "a", "b", false).is_err());
    }
}
