//! The reconciliation diff.

use super::change::Change;
use super::keyed::{Keyed, KeyedSet};

/// Compute the changes that turn `observed` into `desired`.
///
/// Every desired item whose key is missing from `observed` becomes an
/// [`Change::Add`], every observed item whose key is missing from `desired`
/// becomes a [`Change::Remove`], and items present on both sides produce
/// nothing, whatever their non-key fields hold. All adds come first, then
/// all removes, each in identity-key order.
///
/// This is a pure function: it never fails and performs no I/O.
pub fn reconcile<D, O>(mut desired: KeyedSet<D>, mut observed: KeyedSet<O>) -> Vec<Change<D, O>> {
    let shared: Vec<String> =
        desired.keys().filter(|key| observed.contains_key(key)).map(str::to_owned).collect();

    for key in &shared {
        desired.take(key);
        observed.take(key);
    }

    let mut changes = Vec::with_capacity(desired.len() + observed.len());
    changes.extend(desired.into_iter().map(Change::Add));
    changes.extend(observed.into_iter().map(Change::Remove));
    changes
}

/// Build both sets from raw sequences and reconcile them.
pub fn reconcile_items<D: Keyed, O: Keyed>(
    desired: impl IntoIterator<Item = D>,
    observed: impl IntoIterator<Item = O>,
) -> Vec<Change<D, O>> {
    reconcile(KeyedSet::from_items(desired), KeyedSet::from_items(observed))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::change::ChangeKind;

    #[derive(Debug, Clone, PartialEq, Eq)]
    struct Wanted(&'static str);

    #[derive(Debug, Clone, PartialEq, Eq)]
    struct Present {
        key: &'static str,
        revision: u32,
    }

    impl Keyed for Wanted {
        fn identity_key(&self) -> String {
            self.0.to_string()
        }
    }

    impl Keyed for Present {
        fn identity_key(&self) -> String {
            self.key.to_string()
        }
    }

    fn present(key: &'static str) -> Present {
        Present { key, revision: 0 }
    }

    #[test]
    fn test_add_and_remove() {
        let changes = reconcile_items(
            vec![Wanted("A"), Wanted("B")],
            vec![present("B"), present("C")],
        );

        assert_eq!(changes, vec![Change::Add(Wanted("A")), Change::Remove(present("C"))]);
    }

    #[test]
    fn test_empty_desired_removes_everything() {
        let changes = reconcile_items(Vec::<Wanted>::new(), vec![present("X")]);
        assert_eq!(changes, vec![Change::Remove(present("X"))]);
    }

    #[test]
    fn test_empty_observed_adds_everything() {
        let changes = reconcile_items(vec![Wanted("X")], Vec::<Present>::new());
        assert_eq!(changes, vec![Change::Add(Wanted("X"))]);
    }

    #[test]
    fn test_both_empty() {
        let changes = reconcile_items(Vec::<Wanted>::new(), Vec::<Present>::new());
        assert!(changes.is_empty());
    }

    #[test]
    fn test_shared_keys_ignore_other_fields() {
        let changes = reconcile_items(
            vec![Wanted("A")],
            vec![Present { key: "A", revision: 42 }],
        );
        assert!(changes.is_empty());
    }

    #[test]
    fn test_adds_precede_removes_in_key_order() {
        let changes = reconcile_items(
            vec![Wanted("z"), Wanted("m"), Wanted("a")],
            vec![present("y"), present("b")],
        );

        let kinds: Vec<ChangeKind> = changes.iter().map(Change::kind).collect();
        assert_eq!(
            kinds,
            vec![
                ChangeKind::Add,
                ChangeKind::Add,
                ChangeKind::Add,
                ChangeKind::Remove,
                ChangeKind::Remove
            ]
        );

        let keys: Vec<String> = changes.iter().map(Change::identity_key).collect();
        assert_eq!(keys, vec!["a", "m", "z", "b", "y"]);
    }

    #[test]
    fn test_output_independent_of_input_order() {
        let forward = reconcile_items(
            vec![Wanted("a"), Wanted("b"), Wanted("c")],
            vec![present("c"), present("d")],
        );
        let backward = reconcile_items(
            vec![Wanted("c"), Wanted("b"), Wanted("a")],
            vec![present("d"), present("c")],
        );
        assert_eq!(forward, backward);
    }
}
