use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::person::PersonRecord;
use crate::resolve::{NameResolver, Resolution, normalize_name};

/// Insertion-ordered set of [`PersonRecord`]s keyed by canonical name.
///
/// Iteration order is registration order. The fuzzy resolver relies on that
/// to break ties deterministically.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(from = "Vec<PersonRecord>", into = "Vec<PersonRecord>")]
pub struct Registry {
    people: Vec<PersonRecord>,
    index: HashMap<String, usize>,
}

impl From<Vec<PersonRecord>> for Registry {
    fn from(people: Vec<PersonRecord>) -> Self {
        let mut registry = Self::default();
        for person in people {
            if registry.contains(&person.name) {
                continue;
            }
            registry.index.insert(person.name.clone(), registry.people.len());
            registry.people.push(person);
        }
        registry
    }
}

impl From<Registry> for Vec<PersonRecord> {
    fn from(registry: Registry) -> Self {
        registry.people
    }
}

impl Registry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.people.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.people.is_empty()
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&PersonRecord> {
        self.index.get(name).map(|&i| &self.people[i])
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut PersonRecord> {
        self.index.get(name).map(|&i| &mut self.people[i])
    }

    /// Canonical names in registration order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.people.iter().map(|p| p.name.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = &PersonRecord> {
        self.people.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut PersonRecord> {
        self.people.iter_mut()
    }

    /// Fetch the record for `name`, creating it with `id` if absent.
    ///
    /// The ID of an existing record is never changed. The flag is `true`
    /// when a record was created.
    pub fn get_or_create(&mut self, name: &str, id: i64) -> (&mut PersonRecord, bool) {
        if let Some(&i) = self.index.get(name) {
            return (&mut self.people[i], false);
        }
        let i = self.people.len();
        self.people.push(PersonRecord::new(name, id));
        self.index.insert(name.to_string(), i);
        (&mut self.people[i], true)
    }

    /// Normalize `raw` and resolve it against the registered names.
    ///
    /// Returns `None` when the name has no word characters at all.
    pub fn resolve(&self, resolver: &mut NameResolver, raw: &str) -> Option<Resolution> {
        let name = normalize_name(raw);
        if name.is_empty() {
            return None;
        }
        Some(resolver.resolve(&name, self.names()))
    }

    /// Records sorted by descending logged hours; ties keep registration order.
    #[must_use]
    pub fn by_logged_time(&self) -> Vec<&PersonRecord> {
        let mut people: Vec<&PersonRecord> = self.people.iter().collect();
        people.sort_by(|a, b| b.logged_hours.total_cmp(&a.logged_hours));
        people
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_writer_fixes_the_id() {
        let mut reg = Registry::new();
        let (p, created) = reg.get_or_create("Ann Lee", 41);
        assert!(created);
        assert_eq!(p.id, 41);
        let (p, created) = reg.get_or_create("Ann Lee", 0);
        assert!(!created);
        assert_eq!(p.id, 41);
        assert_eq!(reg.len(), 1);
    }

    #[test]
    fn names_keep_registration_order() {
        let mut reg = Registry::new();
        for name in ["Zed", "Ann", "Mo"] {
            reg.get_or_create(name, 0);
        }
        assert_eq!(reg.names().collect::<Vec<_>>(), vec!["Zed", "Ann", "Mo"]);
    }

    #[test]
    fn resolve_normalizes_before_matching() {
        let mut reg = Registry::new();
        reg.get_or_create("John Smith", 1);
        let mut resolver = NameResolver::default();
        let res = reg.resolve(&mut resolver, " John  Smith. ").expect("has words");
        assert_eq!(res, Resolution::Exact("John Smith".into()));
        assert!(reg.resolve(&mut resolver, "--").is_none());
    }

    #[test]
    fn resolving_a_canonical_name_is_idempotent() {
        let mut reg = Registry::new();
        reg.get_or_create("John Smith", 1);
        reg.get_or_create("Jane Smith", 2);
        let mut resolver = NameResolver::default();
        for name in ["John Smith", "Jane Smith"] {
            let res = reg.resolve(&mut resolver, name).expect("has words");
            assert_eq!(res.canonical(), name);
        }
    }

    #[test]
    fn sort_by_logged_time_is_descending_and_stable() {
        let mut reg = Registry::new();
        reg.get_or_create("A", 0).0.logged_hours = 2.0;
        reg.get_or_create("B", 0).0.logged_hours = 5.0;
        reg.get_or_create("C", 0).0.logged_hours = 2.0;
        let order: Vec<_> = reg.by_logged_time().iter().map(|p| p.name.as_str()).collect();
        assert_eq!(order, vec!["B", "A", "C"]);
    }

    #[test]
    fn serde_round_trip_rebuilds_index() {
        let mut reg = Registry::new();
        reg.get_or_create("Ann Lee", 41).0.rank = "Sergeant".into();
        reg.get_or_create("Bo Chen", 42);
        let json = serde_json::to_string(&reg).expect("serialize");
        let back: Registry = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(back.len(), 2);
        assert_eq!(back.get("Ann Lee").map(|p| p.rank.as_str()), Some("Sergeant"));
        assert_eq!(back.get("Bo Chen").map(|p| p.id), Some(42));
    }
}
