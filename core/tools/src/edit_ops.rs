//! Pure content-mutation primitives shared by the `file.edit` tool and the
//! auto-execute/revert engines, so the two layers can never diverge on
//! what an edit mode actually does.

use agentkit_error::CoreError;
use regex::Regex;

/// Apply `find_replace`: regex or literal, first-only or all. Fails if the
/// pattern isn't found.
pub fn apply_find_replace(
    content: &str,
    find_text: &str,
    replace_text: &str,
    use_regex: bool,
    replace_all: bool,
) -> Result<(String, usize), CoreError> {
    if use_regex {
        let re = Regex::new(find_text).map_err(|e| CoreError::ToolExecution {
            message: format!("invalid regex '{find_text}': {e}"),
        })?;
        let count = re.find_iter(content).count();
        if count == 0 {
            return Err(CoreError::ToolExecution {
                message: format!("pattern not found: {find_text}"),
            });
        }
        let applied = if replace_all { count } else { 1 };
        let result = if replace_all {
            re.replace_all(content, replace_text.replace('$', "$$").as_str()).into_owned()
        } else {
            re.replacen(content, 1, replace_text.replace('$', "$$").as_str()).into_owned()
        };
        Ok((result, applied))
    } else {
        let count = content.matches(find_text).count();
        if count == 0 {
            return Err(CoreError::ToolExecution {
                message: format!("text not found: {find_text}"),
            });
        }
        let applied = if replace_all { count } else { 1 };
        let result = if replace_all {
            content.replace(find_text, replace_text)
        } else {
            content.replacen(find_text, replace_text, 1)
        };
        Ok((result, applied))
    }
}

/// Invert a `find_replace` edit: substitute `find_text` back in for
/// occurrences of `replace_text`, literally (the inverse
/// search target is emitted text, never a regex). Returns `None` if
/// `replace_text` is no longer present — the caller falls back to
/// restoring the full original content.
pub fn invert_find_replace(
    current: &str,
    find_text: &str,
    replace_text: &str,
    replace_all: bool,
) -> Option<String> {
    if !current.contains(replace_text) {
        return None;
    }
    Some(if replace_all {
        current.replace(replace_text, find_text)
    } else {
        current.replacen(replace_text, find_text, 1)
    })
}

/// Apply `line_range`: replace the 1-indexed inclusive `[start, end]` span
/// with `new_content`.
pub fn apply_line_range(
    content: &str,
    start_line: usize,
    end_line: usize,
    new_content: &str,
) -> Result<String, CoreError> {
    let lines: Vec<&str> = content.split('\n').collect();
    if start_line == 0 || start_line > end_line || end_line > lines.len() {
        return Err(CoreError::ToolExecution {
            message: format!(
                "invalid line range [{start_line}, {end_line}] for a {}-line file",
                lines.len()
            ),
        });
    }
    let mut out: Vec<&str> = Vec::with_capacity(lines.len());
    out.extend_from_slice(&lines[..start_line - 1]);
    let new_lines: Vec<&str> = new_content.split('\n').collect();
    out.extend(new_lines);
    out.extend_from_slice(&lines[end_line..]);
    Ok(out.join("\n"))
}

/// Reconstruct a `line_range` revert:
/// `current_lines[:start-1] + original_lines[start-1:end] + current_lines[end:]`
/// — this preserves user edits outside the touched range.
pub fn reconstruct_line_range(
    original: &str,
    current: &str,
    start_line: usize,
    end_line: usize,
) -> String {
    let orig_lines: Vec<&str> = original.split('\n').collect();
    let cur_lines: Vec<&str> = current.split('\n').collect();
    let start_idx = (start_line.saturating_sub(1)).min(cur_lines.len());
    let orig_end = end_line.min(orig_lines.len());
    let orig_start = (start_line.saturating_sub(1)).min(orig_lines.len());
    let tail_start = end_line.min(cur_lines.len());

    let mut out: Vec<&str> = Vec::new();
    out.extend_from_slice(&cur_lines[..start_idx]);
    out.extend_from_slice(&orig_lines[orig_start..orig_end]);
    out.extend_from_slice(&cur_lines[tail_start..]);
    out.join("\n")
}
