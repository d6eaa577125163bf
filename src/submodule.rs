use std::sync::LazyLock;

use anyhow::Result;
use regex::Regex;
use snafu::OptionExt as _;

use crate::app::RepoContext;
use crate::error::ReplaceTargetNotFoundSnafu;
use crate::grammar::Grammar;
use crate::paths;

static VENDOR_PREFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(?:.*/)?vendor/").expect("valid regex"));

/// One `key = value` pair from the repository's git configuration.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ConfigEntry {
    pub key: String,
    pub value: String,
}

impl ConfigEntry {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }

    /// `vendor/grammars/Foo` for `submodule.vendor/grammars/Foo.url`.
    pub fn submodule_name(&self) -> Option<&str> {
        self.key.strip_prefix("submodule.")?.strip_suffix(".url")
    }
}

/// Reduce whatever the user typed to a bare grammar name, lower-cased.
///
/// `path/to/vendor/grammars/Foo`, `vendor/grammars/Foo`, `grammars/Foo` and
/// `Foo` all become `foo`.
pub fn normalize_target(target: &str) -> String {
    let target = target.to_lowercase();
    let target = VENDOR_PREFIX.replace(&target, "");
    target
        .strip_prefix("grammars/")
        .unwrap_or(&target)
        .to_string()
}

/// All `submodule.*.url` entries, in configuration order.
pub fn submodule_urls(context: &RepoContext) -> Result<Vec<ConfigEntry>> {
    let repo = git2::Repository::open(context.root())?;
    let config = repo.config()?;
    let mut entries = Vec::new();
    let mut iter = config.entries(Some(r"submodule\..*\.url"))?;
    while let Some(entry) = iter.next() {
        let entry = entry?;
        if let (Some(key), Some(value)) = (entry.name(), entry.value()) {
            entries.push(ConfigEntry::new(key, value));
        }
    }
    Ok(entries)
}

/// First grammar submodule whose URL key matches `target`, compared
/// case-insensitively.
pub fn find_submodule<'a>(entries: &'a [ConfigEntry], target: &str) -> Option<&'a ConfigEntry> {
    let needle = format!(
        "submodule.{}/{}.url",
        paths::GRAMMARS_DIR,
        normalize_target(target)
    );
    entries
        .iter()
        .find(|entry| entry.key.to_lowercase().contains(&needle))
}

/// Deregister and delete the grammar submodule matching `target`, returning
/// its configured name.
pub fn remove(context: &RepoContext, target: &str) -> Result<String> {
    let entries = submodule_urls(context)?;
    let entry = find_submodule(&entries, target)
        .filter(|entry| entry.submodule_name().is_some())
        .context(ReplaceTargetNotFoundSnafu { target })?;
    debug!("Matched {} ({})", entry.key, entry.value);
    let name = entry.submodule_name().unwrap_or_default().to_string();

    info!("Deregistering: {name}");
    context.run("git", ["submodule", "deinit", name.as_str()])?;
    context.run("git", ["rm", "-rf", name.as_str()])?;
    context.run_silently(
        context.root().join(paths::GRAMMAR_COMPILER),
        ["update", "-f"],
        "Updating grammar compiler",
    )?;
    Ok(name)
}

/// Add `grammar` as a submodule and tell the grammar compiler about it.
pub fn register(context: &RepoContext, grammar: &Grammar) -> Result<()> {
    let path = grammar.path.to_string_lossy().into_owned();
    info!("Registering new submodule: {path}");
    context.run("git", ["submodule", "add", "-f", grammar.url.as_str(), path.as_str()])?;
    context.run_silently(
        context.root().join(paths::GRAMMAR_COMPILER),
        ["add", path.as_str()],
        format!("Compiling {path}"),
    )
}
