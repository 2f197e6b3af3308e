//! Plain-text table rendering for resolved trees and factory help.

use std::fmt::Write as _;

use crate::error::Result;
use crate::section::{SpecEntry, join_path};
use crate::tree::{NodeId, Tree};

/// Table of every option in the subtree, sorted by dotted name, with
/// defaulted values marked. Resolves each option, so constraint failures
/// propagate.
pub(crate) fn options_table(tree: &Tree, node: NodeId) -> Result<String> {
    let mut rows = Vec::new();
    collect_value_rows(tree, node, "", &mut rows)?;
    rows.sort_by(|a, b| a.0.cmp(&b.0));

    let mut out = String::from("\nOptions\n=======\n");
    let _ = writeln!(out, "{:<40}|  {}", "Name", "Value");
    out.push_str(&"-".repeat(72));
    out.push('\n');
    for (name, value, defaulted) in rows {
        let marker = if defaulted { "  (default)" } else { "" };
        let _ = writeln!(out, "{name:<40}|  {value}{marker}");
    }
    Ok(out)
}

fn collect_value_rows(
    tree: &Tree,
    node: NodeId,
    prefix: &str,
    rows: &mut Vec<(String, String, bool)>,
) -> Result<()> {
    let data = tree.node(node);
    for name in data.spec.option_names() {
        let value = tree.resolve(node, name)?;
        let defaulted = !data.raw.borrow().contains_key(name);
        rows.push((join_path(prefix, name), value.to_string(), defaulted));
    }
    for (name, child) in &data.children {
        collect_value_rows(tree, *child, &join_path(prefix, name), rows)?;
    }
    Ok(())
}

/// Documentation table for a factory: option, description, evaluated
/// default. Options whose default cannot be evaluated standalone (no
/// default, failed expression, unresolved cycle) are shown as required.
pub(crate) fn help_table(tree: &Tree) -> String {
    let mut rows = Vec::new();
    collect_help_rows(tree, crate::tree::ROOT, "", &mut rows);
    rows.sort_by(|a, b| a.0.cmp(&b.0));

    let headers = ("Option", "Description", "Default");
    let width1 = rows
        .iter()
        .map(|r| r.0.len())
        .chain([headers.0.len()])
        .max()
        .unwrap_or(0);
    let width2 = rows
        .iter()
        .map(|r| r.1.len())
        .chain([headers.1.len()])
        .max()
        .unwrap_or(0);
    let width3 = rows
        .iter()
        .map(|r| r.2.len())
        .chain([headers.2.len()])
        .max()
        .unwrap_or(0);

    let separator = format!(
        "+{}+{}+{}+\n",
        "-".repeat(width1),
        "-".repeat(width2),
        "-".repeat(width3)
    );
    let heavy = format!(
        "+{}+{}+{}+\n",
        "=".repeat(width1),
        "=".repeat(width2),
        "=".repeat(width3)
    );

    let mut out = separator.clone();
    let _ = writeln!(
        out,
        "|{:<width1$}|{:<width2$}|{:<width3$}|",
        headers.0, headers.1, headers.2
    );
    out.push_str(&heavy);
    for (name, doc, default) in rows {
        let _ = writeln!(out, "|{name:<width1$}|{doc:<width2$}|{default:<width3$}|");
        out.push_str(&separator);
    }
    out
}

fn collect_help_rows(
    tree: &Tree,
    node: NodeId,
    prefix: &str,
    rows: &mut Vec<(String, String, String)>,
) {
    let data = tree.node(node);
    for (name, entry) in data.spec.iter() {
        if let SpecEntry::Option(option) = entry {
            let default = match tree.resolve(node, name) {
                Ok(value) => value.to_string(),
                Err(_) => "(required)".to_string(),
            };
            let doc = option.doc_str().unwrap_or("").to_string();
            rows.push((join_path(prefix, name), doc, default));
        }
    }
    for (name, child) in &data.children {
        collect_help_rows(tree, *child, &join_path(prefix, name), rows);
    }
}
