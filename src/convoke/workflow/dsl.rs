//! Textual DSL for wiring a workflow: one `node.out --> node.in` connection
//! per line, with an optional prefab-clone hop (`node --[prefab]--> node`)
//! and a chainable shorthand (`a --> b --> c`).

use super::connector::SINGLE_NODE_PARAM;
use regex::Regex;

/// One parsed connection: `start_node.start_out --> end_node.end_in`,
/// optionally routed through a prefab clone keyed by `prefab_key`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AstNode {
    pub start_node: String,
    pub start_out: String,
    pub end_node: String,
    pub end_in: String,
    pub prefab_key: String,
    pub start_comment: String,
    pub end_comment: String,
}

fn group(caps: &regex::Captures, idx: usize) -> String {
    caps.get(idx).map(|m| m.as_str().trim()).unwrap_or("").to_string()
}

fn or_single(s: String) -> String {
    if s.is_empty() {
        SINGLE_NODE_PARAM.to_string()
    } else {
        s
    }
}

/// Parses every non-blank, non-`%%`-comment line of `script` into a flat
/// list of connections. A line that matches neither supported form is
/// skipped with a warning, matching the original's tolerate-and-continue
/// behavior.
pub fn parse_script(script: &str) -> Vec<AstNode> {
    let mut nodes = Vec::new();
    for (i, raw_line) in script.lines().enumerate() {
        let line = raw_line.trim();
        if line.is_empty() || line.starts_with("%%") {
            continue;
        }
        match parse_line(line) {
            Ok(mut parsed) => nodes.append(&mut parsed),
            Err(e) => log::warn!("skip non-empty line {}: {}", i, e),
        }
    }
    nodes
}

/// Parses a single line, trying the full prefab-aware form first, then the
/// chainable shorthand form.
pub fn parse_line(line: &str) -> Result<Vec<AstNode>, String> {
    let full = Regex::new(
        r"(\w+)(?:[\[\(\{]{1,2}([^()\[\]{}]+)[\]\)\}]{1,2})?\s*--\s*(\w*)\|?([^:]*):?([^|]*)\|?\s*-->\s*(\w+)(?:[\[\(\{]{1,2}([^()\[\]{}]+)[\]\)\}]{1,2})?",
    )
    .expect("static regex");
    if let Some(caps) = full.captures(line) {
        return Ok(vec![AstNode {
            start_node: group(&caps, 1),
            start_comment: group(&caps, 2),
            prefab_key: group(&caps, 3),
            start_out: or_single(group(&caps, 4)),
            end_in: or_single(group(&caps, 5)),
            end_node: group(&caps, 6),
            end_comment: group(&caps, 7),
        }]);
    }

    let simplified = Regex::new(
        r"(\w+)(?:[\[\(\{]{1,2}([^()\[\]{}]+)[\]\)\}]{1,2})?\s*-->\s*(\|([^:]*):([^|]*)\|)?\s*(\w+)(?:[\[\(\{]{1,2}([^()\[\]{}]+)[\]\)\}]{1,2})?((\s*-->\s*(\|([^:]*):([^|]*)\|)?\s*(\w+)(?:[\[\(\{]{1,2}([^()\[\]{}]+)[\]\)\}]{1,2})?)*)",
    )
    .expect("static regex");
    if let Some(caps) = simplified.captures(line) {
        let root = AstNode {
            start_node: group(&caps, 1),
            start_comment: group(&caps, 2),
            prefab_key: String::new(),
            start_out: or_single(group(&caps, 4)),
            end_in: or_single(group(&caps, 5)),
            end_node: group(&caps, 6),
            end_comment: group(&caps, 7),
        };
        let chain_tail = group(&caps, 8);
        let mut out = vec![root];

        let chain_re = Regex::new(
            r"\s*-->\s*(\|([^:]*):([^|]*)\|)?\s*(\w+)(?:[\[\(\{]{1,2}([^()\[\]{}]+)[\]\)\}]{1,2})?",
        )
        .expect("static regex");
        for cm in chain_re.captures_iter(&chain_tail) {
            let prev = out.last().expect("root always pushed first");
            let next = AstNode {
                start_node: prev.end_node.clone(),
                start_comment: prev.end_comment.clone(),
                prefab_key: String::new(),
                start_out: or_single(group(&cm, 2)),
                end_in: or_single(group(&cm, 3)),
                end_node: group(&cm, 4),
                end_comment: group(&cm, 5),
            };
            out.push(next);
        }
        return Ok(out);
    }

    Err(format!("invalid syntax: {}", line))
}
