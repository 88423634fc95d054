//! Entity trait: identity + continuity across state changes.

/// Entity marker + minimal interface.
///
/// Products and sale records are entities: two snapshots with the same id are the
/// same record, even when their fields differ.
pub trait Entity {
    /// Strongly-typed entity identifier.
    type Id: Copy + Eq + core::hash::Hash + core::fmt::Debug;

    /// Returns the entity identifier.
    fn id(&self) -> Self::Id;
}

/// Find an entity by id in a slice of snapshots.
pub fn find_by_id<E: Entity>(items: &[E], id: E::Id) -> Option<&E> {
    items.iter().find(|item| item.id() == id)
}

/// Position of an entity by id in a slice of snapshots.
pub fn position_by_id<E: Entity>(items: &[E], id: E::Id) -> Option<usize> {
    items.iter().position(|item| item.id() == id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    struct Row {
        id: u8,
        label: &'static str,
    }

    impl Entity for Row {
        type Id = u8;

        fn id(&self) -> u8 {
            self.id
        }
    }

    #[test]
    fn lookup_is_by_identity_not_by_fields() {
        let rows = [Row { id: 1, label: "a" }, Row { id: 2, label: "a" }];

        assert_eq!(find_by_id(&rows, 2).map(|r| r.id), Some(2));
        assert_eq!(position_by_id(&rows, 2), Some(1));
        assert!(find_by_id(&rows, 3).is_none());
        assert_eq!(rows[0].label, rows[1].label);
    }
}
