use std::collections::BTreeMap;

/// Names of the Go types of one generation run, mapped to whether their
/// declaration has been emitted yet.
///
/// Every builder receives the registry by reference. A name is emitted at
/// most once, which keeps shared and recursive schemas from being declared
/// twice or expanded forever. Names of component schemas are reserved up
/// front so inline types never steal them.
#[derive(Debug, Default, Clone)]
pub struct TypeRegistry {
    entries: BTreeMap<String, bool>,
}

impl TypeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim `name` without emitting it.
    pub fn reserve(&mut self, name: &str) {
        self.entries.entry(name.to_string()).or_insert(false);
    }

    /// Mark `name` as emitted. Returns `true` when it was not emitted before,
    /// `false` when the caller must skip the declaration.
    pub fn register(&mut self, name: &str) -> bool {
        match self.entries.get_mut(name) {
            Some(true) => {
                tracing::trace!(name, "type already registered");
                false
            }
            Some(emitted) => {
                *emitted = true;
                true
            }
            None => {
                self.entries.insert(name.to_string(), true);
                true
            }
        }
    }

    /// Register the first free name out of `prefix`, `prefix2`, `prefix3`, ...
    pub fn fresh(&mut self, prefix: &str) -> String {
        let mut candidate = prefix.to_string();
        let mut counter = 2;
        while self.entries.contains_key(&candidate) {
            candidate = format!("{prefix}{counter}");
            counter += 1;
        }
        if candidate != prefix {
            tracing::debug!(prefix, name = %candidate, "type name taken, using suffixed name");
        }
        self.entries.insert(candidate.clone(), true);
        candidate
    }

    /// Reserved or emitted.
    pub fn is_taken(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    pub fn is_emitted(&self, name: &str) -> bool {
        self.entries.get(name).copied().unwrap_or(false)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
