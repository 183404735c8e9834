// nmlrs/src/namelist/group.rs

//! Group-level operations on the root node.
//!
//! Groups are nested nodes stored under the root. A group name used more
//! than once becomes a cogroup whose members are the individual groups.

use super::core::Namelist;
use super::value::Value;

impl Namelist {
    /// Get or create a group and return a mutable reference to it.
    ///
    /// For a duplicated group the last member is returned.
    pub fn insert_group(&mut self, name: &str) -> &mut Namelist {
        let needs_group = !matches!(
            self.get(name),
            Some(Value::Group(_)) | Some(Value::Cogroup(_))
        );
        if needs_group {
            self.set(name, Value::Group(Namelist::new()));
        }
        last_group_mut(self, name)
    }

    /// Append a new group, even if one with this name exists.
    ///
    /// Returns the member position of the new group and the group itself.
    pub fn add_group(&mut self, name: &str) -> (usize, &mut Namelist) {
        let position = self.push(name, Value::Group(Namelist::new()));
        (position, last_group_mut(self, name))
    }

    /// First group with this name.
    pub fn get_group(&self, name: &str) -> Option<&Namelist> {
        match self.get(name)? {
            Value::Group(g) => Some(g),
            Value::Cogroup(c) => c.values().find_map(Value::as_group),
            _ => None,
        }
    }

    pub fn get_group_mut(&mut self, name: &str) -> Option<&mut Namelist> {
        match self.get_mut(name)? {
            Value::Group(g) => Some(g),
            Value::Cogroup(c) => c.values_mut().find_map(Value::as_group_mut),
            _ => None,
        }
    }

    /// Every group with this name, in source order.
    pub fn get_groups(&self, name: &str) -> Vec<&Namelist> {
        self.get(name)
            .map(|v| v.members().into_iter().filter_map(Value::as_group).collect())
            .unwrap_or_default()
    }

    pub fn has_group(&self, name: &str) -> bool {
        self.get_group(name).is_some()
    }

    /// All groups in order, with duplicated groups expanded in place.
    pub fn groups(&self) -> impl Iterator<Item = (&str, &Namelist)> {
        self.iter().flat_map(|(name, value)| {
            value
                .members()
                .into_iter()
                .filter_map(Value::as_group)
                .map(move |g| (name, g))
        })
    }

    /// Group names in order, one per distinct name.
    pub fn group_names(&self) -> Vec<&str> {
        self.keys().collect()
    }
}

fn last_group_mut<'a>(node: &'a mut Namelist, name: &str) -> &'a mut Namelist {
    let value = match node.get_mut(name) {
        Some(Value::Cogroup(c)) => c.last_mut(),
        other => other,
    };
    match value {
        Some(Value::Group(g)) => g,
        // Callers guarantee the entry is a group; replace anything else.
        Some(other) => {
            *other = Value::Group(Namelist::new());
            match other {
                Value::Group(g) => g,
                _ => unreachable!("entry was just replaced with a group"),
            }
        }
        None => unreachable!("group entry was just inserted"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_group_chain() {
        let mut nml = Namelist::new();
        nml.insert_group("data_nml")
            .insert("x", 1i64)
            .insert("y", 2.0f64);
        nml.insert_group("DATA_NML").insert("z", true);

        let group = nml.get_group("data_nml").unwrap();
        assert_eq!(group.len(), 3);
        assert_eq!(group.get_bool("z"), Some(true));
    }

    #[test]
    fn test_add_group_duplicates() {
        let mut nml = Namelist::new();
        let (first, g) = nml.add_group("run");
        g.set("id", 1i64);
        let (second, g) = nml.add_group("Run");
        g.set("id", 2i64);
        nml.add_group("other");

        assert_eq!((first, second), (0, 1));
        let ids: Vec<i64> = nml
            .get_groups("run")
            .iter()
            .map(|g| g.get_i64("id").unwrap())
            .collect();
        assert_eq!(ids, vec![1, 2]);
        let order: Vec<&str> = nml.groups().map(|(name, _)| name).collect();
        assert_eq!(order, vec!["run", "run", "other"]);
        assert_eq!(nml.group_names(), vec!["run", "other"]);
    }
}
