//! Entity trait: records with a stable identity across state changes.

/// Entity marker + minimal interface.
pub trait Entity {
    /// Strongly-typed, ordered entity identifier.
    type Id: Copy + Ord + core::hash::Hash + core::fmt::Debug;

    /// Returns the entity identifier.
    fn id(&self) -> Self::Id;
}

/// Index of the entity with `id` in `items`, if present.
pub fn position_of<E: Entity>(items: &[E], id: E::Id) -> Option<usize> {
    items.iter().position(|item| item.id() == id)
}

/// Next free identifier after the largest one in `items` (or `first` when empty).
pub fn next_id<E, F>(items: &[E], first: E::Id, succ: F) -> E::Id
where
    E: Entity,
    F: Fn(E::Id) -> E::Id,
{
    items.iter().map(Entity::id).max().map(succ).unwrap_or(first)
}
