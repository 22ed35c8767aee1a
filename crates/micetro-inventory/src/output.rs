//! Output rendering: Ansible inventory JSON plus JSON/YAML for lookups.
//!
//! stdout carries only the rendered document; logs go to stderr.

use std::io::{self, Write};

use indexmap::IndexMap;
use serde::Serialize;
use serde_json::{Value, json};

use micetro_core::{ALL_GROUP, Inventory};

use crate::cli::OutputFormat;
use crate::error::CliError;

// ── Ansible inventory ────────────────────────────────────────────────

/// Per-host variables. A host listed more than once keeps the address of
/// its last entry.
pub fn hostvars(inventory: &Inventory) -> IndexMap<&str, Value> {
    let mut vars = IndexMap::new();
    for host in &inventory.hosts {
        vars.insert(host.name.as_str(), json!({ "ansible_host": host.address }));
    }
    vars
}

/// `--list` document:
/// `{ "_meta": { "hostvars": {..} }, "<group>": { "hosts": [..] }, .. }`.
///
/// Group member lists are de-duplicated, keeping first-seen order.
pub fn ansible_list(inventory: &Inventory) -> IndexMap<&str, Value> {
    let mut doc = IndexMap::new();
    doc.insert("_meta", json!({ "hostvars": hostvars(inventory) }));

    if !inventory.groups.contains_key(ALL_GROUP) {
        doc.insert(ALL_GROUP, json!({ "hosts": [] }));
    }
    for (group, members) in &inventory.groups {
        let mut seen = indexmap::IndexSet::new();
        let hosts: Vec<&str> = members
            .iter()
            .map(String::as_str)
            .filter(|h| seen.insert(*h))
            .collect();
        doc.insert(group.as_str(), json!({ "hosts": hosts }));
    }
    doc
}

/// `--host NAME` document; `{}` for unknown hosts.
pub fn ansible_host(inventory: &Inventory, name: &str) -> Value {
    hostvars(inventory)
        .swap_remove(name)
        .unwrap_or_else(|| json!({}))
}

// ── Render helpers ───────────────────────────────────────────────────

pub fn render_json<T: Serialize + ?Sized>(data: &T, pretty: bool) -> Result<String, CliError> {
    Ok(if pretty {
        serde_json::to_string_pretty(data)?
    } else {
        serde_json::to_string(data)?
    })
}

pub fn render<T: Serialize + ?Sized>(
    data: &T,
    format: OutputFormat,
    pretty: bool,
) -> Result<String, CliError> {
    match format {
        OutputFormat::Json => render_json(data, pretty),
        OutputFormat::Yaml => Ok(serde_yaml::to_string(data)?),
    }
}

pub fn print_output(output: &str) -> Result<(), CliError> {
    let mut stdout = io::stdout().lock();
    writeln!(stdout, "{}", output.trim_end())?;
    stdout.flush()?;
    Ok(())
}
