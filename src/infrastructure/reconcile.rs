// Three-way diff between stored child rows and an aggregate's current state
// Used by every adapter's `update` for members, participants and technologies

use std::collections::BTreeMap;

/// Row changes needed to make storage match the aggregate
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Changeset<K, V> {
    /// Present in the aggregate, absent in storage
    pub inserted: Vec<(K, V)>,
    /// Present in storage, absent in the aggregate
    pub deleted: Vec<K>,
    /// Present in both with different values; carries the aggregate's value
    pub updated: Vec<(K, V)>,
}

impl<K, V> Changeset<K, V> {
    pub fn is_empty(&self) -> bool {
        self.inserted.is_empty() && self.deleted.is_empty() && self.updated.is_empty()
    }
}

/// Diffs `stored` against `current`, keyed by identity
///
/// Entries equal on both sides produce no change.
///
/// # Example
/// ```
/// use devcollab_api::infrastructure::reconcile::diff;
/// use std::collections::BTreeMap;
///
/// let stored = BTreeMap::from([(1, "a"), (2, "b")]);
/// let current = BTreeMap::from([(2, "c"), (3, "d")]);
///
/// let changes = diff(&stored, &current);
/// assert_eq!(changes.inserted, vec![(3, "d")]);
/// assert_eq!(changes.deleted, vec![1]);
/// assert_eq!(changes.updated, vec![(2, "c")]);
/// ```
pub fn diff<K, V>(stored: &BTreeMap<K, V>, current: &BTreeMap<K, V>) -> Changeset<K, V>
where
    K: Ord + Clone,
    V: PartialEq + Clone,
{
    let mut changes = Changeset {
        inserted: Vec::new(),
        deleted: Vec::new(),
        updated: Vec::new(),
    };

    for (key, value) in current {
        match stored.get(key) {
            None => changes.inserted.push((key.clone(), value.clone())),
            Some(old) if old != value => changes.updated.push((key.clone(), value.clone())),
            Some(_) => {}
        }
    }
    changes.deleted = stored
        .keys()
        .filter(|key| !current.contains_key(*key))
        .cloned()
        .collect();

    changes
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    #[test]
    fn identical_maps_produce_no_changes() {
        let rows = BTreeMap::from([(1, BTreeSet::from(["owner"]))]);
        assert!(diff(&rows, &rows).is_empty());
    }

    #[test]
    fn role_change_is_an_update() {
        let stored = BTreeMap::from([(7, BTreeSet::from(["developer"]))]);
        let current = BTreeMap::from([(7, BTreeSet::from(["developer", "qa"]))]);

        let changes = diff(&stored, &current);

        assert!(changes.inserted.is_empty());
        assert!(changes.deleted.is_empty());
        assert_eq!(
            changes.updated,
            vec![(7, BTreeSet::from(["developer", "qa"]))]
        );
    }

    #[test]
    fn set_membership_diff_with_unit_values() {
        let stored: BTreeMap<&str, ()> = BTreeMap::from([("python", ())]);
        let current: BTreeMap<&str, ()> = BTreeMap::from([("react", ())]);

        let changes = diff(&stored, &current);

        assert_eq!(changes.inserted, vec![("react", ())]);
        assert_eq!(changes.deleted, vec!["python"]);
        assert!(changes.updated.is_empty());
    }

    #[test]
    fn empty_stored_inserts_everything() {
        let current = BTreeMap::from([(1, 'a'), (2, 'b')]);
        let changes = diff(&BTreeMap::new(), &current);

        assert_eq!(changes.inserted.len(), 2);
        assert!(changes.deleted.is_empty());
    }
}
