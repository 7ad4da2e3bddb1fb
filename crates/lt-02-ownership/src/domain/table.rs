//! The static ownership table.

use shared_types::{ContextKind, TabId};

/// Who may write a path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Owner {
    /// Exactly one tab.
    Tab(TabId),
    /// Any context; values on these paths merge monotonically.
    Shared,
    /// Not in the table; only the system writer.
    SystemOnly,
}

/// Prefix rules, longest match wins.
#[derive(Debug, Clone)]
pub struct OwnershipTable {
    rules: Vec<(String, Owner)>,
}

impl OwnershipTable {
    /// The game's partition.
    #[must_use]
    pub fn standard() -> Self {
        Self::empty()
            .with_rule("player.hasFlashlight", Owner::Tab(TabId(2)))
            .with_rule("player.codeFragments", Owner::Tab(TabId(4)))
            .with_rule("player.mindFragments", Owner::Tab(TabId(5)))
            .with_rule("narrative.shown", Owner::Shared)
            .with_rule("meta", Owner::Shared)
    }

    /// A table with no explicit rules. `tabs.<n>.*` still belongs to tab `n`.
    #[must_use]
    pub fn empty() -> Self {
        Self { rules: Vec::new() }
    }

    /// Add or replace a rule.
    #[must_use]
    pub fn with_rule(mut self, prefix: &str, owner: Owner) -> Self {
        self.rules.retain(|(p, _)| p != prefix);
        self.rules.push((prefix.to_string(), owner));
        self
    }

    /// Owner of a dotted path.
    #[must_use]
    pub fn owner_of(&self, path: &str) -> Owner {
        if let Some(rest) = path.strip_prefix("tabs.") {
            let id = rest.split('.').next().unwrap_or_default();
            return match id.parse::<TabId>() {
                Ok(tab) => Owner::Tab(tab),
                Err(_) => Owner::SystemOnly,
            };
        }

        self.rules
            .iter()
            .filter(|(prefix, _)| covers(prefix, path))
            .max_by_key(|(prefix, _)| prefix.len())
            .map_or(Owner::SystemOnly, |(_, owner)| *owner)
    }

    /// Whether `writer` may write `path`.
    #[must_use]
    pub fn may_write(&self, writer: ContextKind, path: &str) -> bool {
        match (writer, self.owner_of(path)) {
            (ContextKind::System, _) | (_, Owner::Shared) => true,
            (ContextKind::Tab(tab), Owner::Tab(owner)) => tab == owner,
            (ContextKind::Tab(_), Owner::SystemOnly) => false,
        }
    }

    /// The subset of `paths` `writer` may not write.
    #[must_use]
    pub fn violations(&self, writer: ContextKind, paths: &[String]) -> Vec<String> {
        paths
            .iter()
            .filter(|path| !self.may_write(writer, path))
            .cloned()
            .collect()
    }
}

impl Default for OwnershipTable {
    fn default() -> Self {
        Self::standard()
    }
}

fn covers(prefix: &str, path: &str) -> bool {
    path == prefix
        || path
            .strip_prefix(prefix)
            .is_some_and(|rest| rest.starts_with('.'))
}
