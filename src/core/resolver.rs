//! Reference expression resolution.
//!
//! Parameter strings may embed `<% $path.to[0].value %>` tokens that are
//! expanded against the job document before a plugin is invoked. Expression
//! scanning is a single regex pass; the dotted path inside each token goes
//! through an explicit segment parser that emits a tagged op sequence
//! (mapping lookup / sequence index) which is then walked over the document.
//!
//! Resolution is a pure function of (document, task role, input): no I/O,
//! no mutation. Any failure to resolve is an error, never a silent
//! pass-through of a wrong value.

use std::sync::OnceLock;

use regex::Regex;
use serde_yml::Value;

use crate::error::{Error, Result};
use crate::jobconfig::JobConfig;

fn expr_regex() -> &'static Regex {
    static EXPR: OnceLock<Regex> = OnceLock::new();
    EXPR.get_or_init(|| Regex::new(r"(?s)<%\s*\$(.*?)\s*%>").expect("expression pattern is valid"))
}

/// One step of a parsed reference path.
#[derive(Debug, Clone, PartialEq, Eq)]
enum PathOp {
    Key(String),
    Index(usize),
}

/// Expand every reference expression in `input`; literal text outside the
/// expression delimiters passes through unchanged.
pub fn resolve_references(input: &str, job: &JobConfig, taskrole: &str) -> Result<String> {
    if input.is_empty() {
        return Ok(String::new());
    }

    let mut out = String::with_capacity(input.len());
    let mut last = 0;
    for caps in expr_regex().captures_iter(input) {
        let Some(whole) = caps.get(0) else { continue };
        let path = caps.get(1).map_or("", |g| g.as_str());

        out.push_str(&input[last..whole.start()]);
        out.push_str(&value_to_string(resolve_path(path, job, taskrole)?));
        last = whole.end();
    }
    out.push_str(&input[last..]);

    Ok(out)
}

/// Resolve a single dotted path against the document.
fn resolve_path<'a>(path: &str, job: &'a JobConfig, taskrole: &str) -> Result<&'a Value> {
    let (root, ops) = parse_path(path)?;
    let mut cur = root_element(&root, job, taskrole, path)?;

    for op in &ops {
        cur = match op {
            PathOp::Key(key) => cur
                .get(key.as_str())
                .ok_or_else(|| Error::resolution(path, format!("missing key '{}'", key)))?,
            PathOp::Index(i) => cur.as_sequence().and_then(|s| s.get(*i)).ok_or_else(|| {
                Error::resolution(path, format!("index {} out of range or not a sequence", i))
            })?,
        };
    }

    Ok(cur)
}

/// Canonical string form of a resolved value: strings verbatim, scalars in
/// display form, null empty, nested structures as compact JSON.
pub fn value_to_string(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::String(s) => s.clone(),
        other => serde_json::to_string(other).unwrap_or_else(|_| {
            serde_yml::to_string(other)
                .unwrap_or_default()
                .trim_end()
                .to_string()
        }),
    }
}

fn parse_path(expr: &str) -> Result<(String, Vec<PathOp>)> {
    let mut ops = Vec::new();
    for segment in expr.split('.') {
        push_segment_ops(segment, expr, &mut ops)?;
    }

    if ops.is_empty() {
        return Err(Error::resolution(expr, "empty reference path"));
    }
    match ops.remove(0) {
        PathOp::Key(root) => Ok((root, ops)),
        PathOp::Index(_) => Err(Error::resolution(
            expr,
            "reference must start with a root name",
        )),
    }
}

/// Tokenize one `.`-separated segment into an optional mapping lookup
/// followed by zero or more sequence indexes. A segment that is purely an
/// index group (`[3]`) emits only the index op.
fn push_segment_ops(segment: &str, expr: &str, ops: &mut Vec<PathOp>) -> Result<()> {
    let segment = segment.trim();
    if segment.is_empty() {
        return Err(Error::resolution(expr, "empty path segment"));
    }

    let Some(open) = segment.find('[') else {
        ops.push(PathOp::Key(segment.to_string()));
        return Ok(());
    };

    let name = &segment[..open];
    if !name.is_empty() {
        ops.push(PathOp::Key(name.to_string()));
    }

    let mut rest = &segment[open..];
    while !rest.is_empty() {
        let Some(inner) = rest.strip_prefix('[') else {
            return Err(Error::resolution(
                expr,
                format!("unexpected text after index in segment '{}'", segment),
            ));
        };
        let Some(close) = inner.find(']') else {
            return Err(Error::resolution(
                expr,
                format!("unterminated index in segment '{}'", segment),
            ));
        };
        let digits = inner[..close].trim();
        let index = digits.parse::<usize>().map_err(|_| {
            Error::resolution(
                expr,
                format!("invalid index '{}' in segment '{}'", digits, segment),
            )
        })?;
        ops.push(PathOp::Index(index));
        rest = &inner[close + 1..];
    }

    Ok(())
}

/// Select the root element a path starts from.
///
/// `parameters` and `secrets` name top-level document sections. `script`,
/// `output` and `data` select the prerequisite whose type matches the root
/// and whose name matches the task role's binding for that type. Duplicate
/// matches resolve to the first declared prerequisite.
fn root_element<'a>(
    root: &str,
    job: &'a JobConfig,
    taskrole: &str,
    expr: &str,
) -> Result<&'a Value> {
    match root {
        "parameters" => Ok(&job.parameters),
        "secrets" => Ok(&job.secrets),
        "script" | "output" | "data" => {
            let binding = job.task_roles.get(taskrole).ok_or_else(|| {
                Error::resolution(expr, format!("unknown task role '{}'", taskrole))
            })?;
            let wanted = binding.get(root).and_then(Value::as_str).ok_or_else(|| {
                Error::resolution(
                    expr,
                    format!("task role '{}' declares no '{}' prerequisite", taskrole, root),
                )
            })?;
            job.prerequisites
                .iter()
                .find(|p| {
                    p.get("type").and_then(Value::as_str) == Some(root)
                        && p.get("name").and_then(Value::as_str) == Some(wanted)
                })
                .ok_or_else(|| {
                    Error::resolution(
                        expr,
                        format!("no prerequisite of type '{}' named '{}'", root, wanted),
                    )
                })
        }
        other => Err(Error::resolution(
            expr,
            format!("unknown reference root '{}'", other),
        )),
    }
}
