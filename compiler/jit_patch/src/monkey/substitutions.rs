//! Runtime-side substitution registry.
//!
//! Mirrors the resolver the injected `$__KMONKEY__N = ...patched(...)` lines
//! call: given the namespace a reference was written in and the name as
//! written, answer the name that should actually be called.

use rustc_hash::FxHashMap;

use super::blacklist::UNSUPPORTED;
use crate::PatchError;

/// Registered replacements, keyed by lowercase fully qualified name.
#[derive(Clone, Debug, Default)]
pub struct Substitutions {
    entries: FxHashMap<String, String>,
}

impl Substitutions {
    pub fn new() -> Self {
        Substitutions::default()
    }

    /// Redirect `name` to `substitute`.
    ///
    /// # Errors
    ///
    /// Global builtins that read the caller's frame cannot be redirected.
    pub fn patch(&mut self, name: &str, substitute: impl Into<String>) -> Result<(), PatchError> {
        let name = name.trim_start_matches('\\');
        let key = name.to_ascii_lowercase();
        if UNSUPPORTED.contains(&key.as_str()) {
            return Err(PatchError::UnsupportedPatchTarget {
                name: name.to_string(),
            });
        }
        self.entries.insert(key, substitute.into());
        Ok(())
    }

    pub fn is_patched(&self, name: &str) -> bool {
        self.lookup(name.trim_start_matches('\\')).is_some()
    }

    /// Name to call for `name` written inside `namespace`.
    ///
    /// Functions fall back to the global name the way unqualified calls do.
    /// Without a substitution the namespaced name is returned as is.
    pub fn resolve(&self, namespace: Option<&str>, name: &str, is_function: bool) -> String {
        let name = name.trim_start_matches('\\');
        let full = match namespace {
            Some(ns) if !ns.is_empty() => format!("{}\\{name}", ns.trim_matches('\\')),
            _ => name.to_string(),
        };
        if let Some(sub) = self.lookup(&full) {
            return sub.to_string();
        }
        if is_function && !name.contains('\\') {
            if let Some(sub) = self.lookup(name) {
                return sub.to_string();
            }
        }
        full
    }

    /// Drop every substitution.
    pub fn reset(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn lookup(&self, name: &str) -> Option<&str> {
        self.entries
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }
}
