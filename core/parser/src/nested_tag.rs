//! Nested-tag micro-format for `object`/`array`-typed `<PARAM>` values.
//!
//! A block whose top-level children are all `<item>` decodes to an array; a
//! block with named children decodes to a mapping from tag name to
//! (recursively parsed) value; a single `<item>` at the outermost level
//! unwraps to the scalar.

use std::collections::BTreeMap;

use agentkit_types::ParamValue;

struct TagMatch {
    name: String,
    inner: String,
}

fn scan_top_level_tags(text: &str) -> Vec<TagMatch> {
    let mut out = Vec::new();
    let mut i = 0usize;
    while i < text.len() {
        let Some(rel_open) = text[i..].find('<') else {
            break;
        };
        let open_start = i + rel_open;
        let Some(rel_close) = text[open_start..].find('>') else {
            break;
        };
        let close_bracket = open_start + rel_close;
        let tag_content = &text[open_start + 1..close_bracket];
        if tag_content.starts_with('/') || tag_content.starts_with('!') || tag_content.starts_with('?') {
            i = close_bracket + 1;
            continue;
        }
        let tag_name = tag_content
            .split_whitespace()
            .next()
            .unwrap_or("")
            .trim_end_matches('/')
            .to_string();
        if tag_name.is_empty() {
            i = close_bracket + 1;
            continue;
        }
        if tag_content.ends_with('/') {
            out.push(TagMatch {
                name: tag_name,
                inner: String::new(),
            });
            i = close_bracket + 1;
            continue;
        }

        let open_prefix = format!("<{tag_name}");
        let close_tag = format!("</{tag_name}>");
        let mut depth = 1i32;
        let mut search_from = close_bracket + 1;
        let mut end_idx = None;
        loop {
            let next_open = text[search_from..].find(&open_prefix).map(|p| p + search_from);
            let next_close = text[search_from..].find(&close_tag).map(|p| p + search_from);
            match (next_open, next_close) {
                (Some(o), Some(c)) if o < c => {
                    depth += 1;
                    search_from = o + open_prefix.len();
                }
                (_, Some(c)) => {
                    depth -= 1;
                    if depth == 0 {
                        end_idx = Some(c);
                        break;
                    }
                    search_from = c + close_tag.len();
                }
                _ => break,
            }
        }

        match end_idx {
            Some(end_idx) => {
                let inner = text[close_bracket + 1..end_idx].to_string();
                out.push(TagMatch {
                    name: tag_name,
                    inner,
                });
                i = end_idx + close_tag.len();
            }
            None => break,
        }
    }
    out
}

fn parse_value_or_string(inner: &str) -> ParamValue {
    match parse(inner) {
        Some(v) => v,
        None => ParamValue::String(inner.trim().to_string()),
    }
}

/// Parse a `<PARAM>` body using the nested-tag micro-format. Returns `None`
/// when the text contains no top-level tags at all (caller falls through
/// to JSON, then a permissive literal, then plain text).
pub fn parse(text: &str) -> Option<ParamValue> {
    let tags = scan_top_level_tags(text);
    if tags.is_empty() {
        return None;
    }

    let all_item = tags.iter().all(|t| t.name.eq_ignore_ascii_case("item"));
    if all_item {
        if tags.len() == 1 {
            return Some(parse_value_or_string(&tags[0].inner));
        }
        return Some(ParamValue::Array(
            tags.iter().map(|t| parse_value_or_string(&t.inner)).collect(),
        ));
    }

    let mut map = BTreeMap::new();
    for t in &tags {
        map.insert(t.name.clone(), parse_value_or_string(&t.inner));
    }
    Some(ParamValue::Object(map))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_item_children_decode_to_array() {
        let v = parse("<item>a</item><item>b</item>").unwrap();
        assert_eq!(
            v,
            ParamValue::Array(vec![ParamValue::String("a".into()), ParamValue::String("b".into())])
        );
    }

    #[test]
    fn single_item_unwraps_to_scalar() {
        let v = parse("<item>solo</item>").unwrap();
        assert_eq!(v, ParamValue::String("solo".into()));
    }

    #[test]
    fn named_children_decode_to_object() {
        let v = parse("<task_description>do it</task_description><steps><item>a</item><item>b</item></steps>").unwrap();
        let map = v.as_object().unwrap();
        assert_eq!(map.get("task_description").unwrap().as_str(), Some("do it"));
        assert_eq!(
            map.get("steps").unwrap().as_array().unwrap().len(),
            2
        );
    }

    #[test]
    fn no_top_level_tags_returns_none() {
        assert!(parse("just plain text").is_none());
        assert!(parse("[1, 2, 3]").is_none());
    }

    #[test]
    fn recursive_object_in_array_items() {
        let v = parse(
            "<item><step_id>1</step_id><description>first</description></item>\
             <item><step_id>2</step_id><description>second</description></item>",
        )
        .unwrap();
        let arr = v.as_array().unwrap();
        assert_eq!(arr.len(), 2);
        let first = arr[0].as_object().unwrap();
        assert_eq!(first.get("step_id").unwrap().as_str(), Some("1"));
    }
}
