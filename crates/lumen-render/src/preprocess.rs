//! Conditional compilation for WGSL sources
//!
//! WGSL has no preprocessor, so shader permutations are expressed with
//! line directives resolved against a [`DefineSet`] before compilation:
//!
//! ```text
//! #ifdef NAME / #ifndef NAME
//! #elifdef NAME
//! #else
//! #endif
//! ```
//!
//! Directive lines and inactive lines are blanked rather than removed, so
//! line numbers in compiler diagnostics match the source file.

use crate::context::RenderError;
use lumen_shading::DefineSet;

struct Branch {
    /// Whether the enclosing block is emitting
    outer: bool,
    /// Whether some branch of this chain has already been taken
    taken: bool,
    active: bool,
    seen_else: bool,
}

pub fn preprocess(source: &str, defines: &DefineSet) -> Result<String, RenderError> {
    let mut out = String::with_capacity(source.len());
    let mut stack: Vec<Branch> = Vec::new();

    for (index, line) in source.lines().enumerate() {
        let line_no = index + 1;
        let emitting = stack.last().map_or(true, |b| b.active);
        let trimmed = line.trim_start();

        if let Some(directive) = trimmed.strip_prefix('#') {
            let mut parts = directive.split_whitespace();
            let keyword = parts.next().unwrap_or("");
            let symbol = parts.next();

            match keyword {
                "ifdef" | "ifndef" => {
                    let symbol = require_symbol(symbol, keyword, line_no)?;
                    let defined = defines.contains(symbol);
                    let hit = if keyword == "ifdef" { defined } else { !defined };
                    stack.push(Branch {
                        outer: emitting,
                        taken: hit,
                        active: emitting && hit,
                        seen_else: false,
                    });
                }
                "elifdef" => {
                    let symbol = require_symbol(symbol, keyword, line_no)?;
                    let branch = open_branch(&mut stack, keyword, line_no)?;
                    let hit = !branch.taken && defines.contains(symbol);
                    branch.active = branch.outer && hit;
                    branch.taken |= hit;
                }
                "else" => {
                    let branch = open_branch(&mut stack, keyword, line_no)?;
                    branch.active = branch.outer && !branch.taken;
                    branch.taken = true;
                    branch.seen_else = true;
                }
                "endif" => {
                    if stack.pop().is_none() {
                        return Err(directive_error(line_no, "#endif without #ifdef"));
                    }
                }
                other => {
                    return Err(directive_error(line_no, &format!("unknown directive #{}", other)));
                }
            }
            out.push('\n');
            continue;
        }

        if emitting {
            out.push_str(line);
        }
        out.push('\n');
    }

    if !stack.is_empty() {
        return Err(directive_error(
            source.lines().count(),
            &format!("{} unterminated conditional block(s)", stack.len()),
        ));
    }
    Ok(out)
}

fn require_symbol<'a>(symbol: Option<&'a str>, keyword: &str, line: usize) -> Result<&'a str, RenderError> {
    symbol.ok_or_else(|| directive_error(line, &format!("#{} needs a symbol", keyword)))
}

fn open_branch<'a>(stack: &'a mut [Branch], keyword: &str, line: usize) -> Result<&'a mut Branch, RenderError> {
    match stack.last_mut() {
        Some(branch) if !branch.seen_else => Ok(branch),
        Some(_) => Err(directive_error(line, &format!("#{} after #else", keyword))),
        None => Err(directive_error(line, &format!("#{} without #ifdef", keyword))),
    }
}

fn directive_error(line: usize, reason: &str) -> RenderError {
    RenderError::Preprocess {
        line,
        reason: reason.to_string(),
    }
}
