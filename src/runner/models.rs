use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;

use crate::model::config::ModelEntry;

static ANSI_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\x1b\[[0-9;?]*[A-Za-z]").expect("valid ansi regex"));
static MODEL_LINE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([a-zA-Z0-9._-]+)\s+-\s+(.+?)(?:\s+\((?:current|default)\))*\s*$")
        .expect("valid model line regex")
});

/// Parse `id - Display Name` lines printed by `cursor-agent models`.
pub fn parse_models(output: &str) -> Vec<ModelEntry> {
    let clean = ANSI_RE.replace_all(output, "");
    let mut seen = HashSet::new();

    clean
        .lines()
        .map(str::trim)
        .filter_map(|line| MODEL_LINE_RE.captures(line))
        .filter_map(|caps| {
            let id = caps[1].to_string();
            let name = caps[2].trim().to_string();
            seen.insert(id.clone()).then_some(ModelEntry { id, name })
        })
        .collect()
}
