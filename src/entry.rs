//! The in-memory value type the rest of the crate reads, mutates, and writes
//! back; the core never owns an `Entry`'s lifetime across calls.

use std::collections::BTreeMap;

use crate::dn::Dn;

/// A single directory entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    /// Display form of the DN (preserves the caller's original casing/escaping).
    pub name: String,
    /// Canonical DN used for path derivation and comparison.
    pub normalized_name: Dn,
    /// Attribute values, keyed by attribute description, insertion order
    /// within a value list preserved.
    pub attributes: BTreeMap<String, Vec<String>>,
    /// Cached objectclass-validation result; cleared whenever `objectClass`
    /// changes so the next schema check re-runs instead of trusting a stale
    /// pass.
    pub schema_checked: bool,
}

impl Entry {
    /// Build a fresh, not-yet-validated entry.
    pub fn new(name: String, normalized_name: Dn) -> Self {
        Entry {
            name,
            normalized_name,
            attributes: BTreeMap::new(),
            schema_checked: false,
        }
    }

    /// All values of `attr`, or an empty slice if the attribute is absent.
    pub fn values(&self, attr: &str) -> &[String] {
        self.attributes
            .get(attr)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// The first value of `attr`, if present.
    pub fn first_value(&self, attr: &str) -> Option<&str> {
        self.values(attr).first().map(String::as_str)
    }

    /// `true` iff `attr` has at least one value.
    pub fn has_attribute(&self, attr: &str) -> bool {
        self.attributes
            .get(attr)
            .is_some_and(|values| !values.is_empty())
    }

    /// Add `value` to `attr`, creating the attribute if necessary. Returns
    /// `false` (no-op) if the value is already present.
    pub fn add_value(&mut self, attr: &str, value: String) -> bool {
        let values = self.attributes.entry(attr.to_string()).or_default();
        if values.iter().any(|v| v == &value) {
            return false;
        }
        values.push(value);
        if attr.eq_ignore_ascii_case("objectClass") {
            self.schema_checked = false;
        }
        true
    }

    /// Remove `value` from `attr`. Returns `true` iff a value was removed.
    pub fn remove_value(&mut self, attr: &str, value: &str) -> bool {
        let removed = match self.attributes.get_mut(attr) {
            Some(values) => {
                let before = values.len();
                values.retain(|v| v != value);
                let after = values.len();
                if values.is_empty() {
                    self.attributes.remove(attr);
                }
                after != before
            }
            None => false,
        };
        if removed && attr.eq_ignore_ascii_case("objectClass") {
            self.schema_checked = false;
        }
        removed
    }

    /// Remove every value of `attr`. Returns `true` iff the attribute
    /// existed.
    pub fn remove_attribute(&mut self, attr: &str) -> bool {
        let removed = self.attributes.remove(attr).is_some();
        if removed && attr.eq_ignore_ascii_case("objectClass") {
            self.schema_checked = false;
        }
        removed
    }

    /// Replace all values of `attr` with `values`, creating or clearing the
    /// attribute as needed.
    pub fn replace_values(&mut self, attr: &str, values: Vec<String>) {
        if values.is_empty() {
            self.attributes.remove(attr);
        } else {
            self.attributes.insert(attr.to_string(), values);
        }
        if attr.eq_ignore_ascii_case("objectClass") {
            self.schema_checked = false;
        }
    }

    /// Splice `parent` onto this entry's currently leaf-only DN, updating
    /// both `name` and `normalized_name` to the full DN.
    ///
    /// An entry file on disk stores only its own leaf RDN (§3); every read
    /// path reconstructs the full DN by grafting on the parent DN inherited
    /// from the path the entry was read through.
    pub fn graft_parent(&mut self, parent: &Dn) {
        let full = parent.with_leaf(&self.normalized_name);
        self.name = full.to_string();
        self.normalized_name = full;
    }

    /// Build the on-disk form of this entry: a clone with both `name` and
    /// `normalized_name` truncated to just the leaf RDN.
    ///
    /// The inverse of [`Entry::graft_parent`] — every write path calls this
    /// immediately before serializing, so the full DN this crate tracks in
    /// memory never ends up duplicated in a file's `dn:` line.
    pub fn into_leaf_only_storage_form(&self) -> Entry {
        let leaf = self.normalized_name.leaf_only();
        Entry {
            name: leaf.to_string(),
            normalized_name: leaf,
            attributes: self.attributes.clone(),
            schema_checked: self.schema_checked,
        }
    }
}
