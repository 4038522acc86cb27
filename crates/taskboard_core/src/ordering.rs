//! In-memory position index for one column.
//!
//! # Responsibility
//! - Own the `(scope, position)` sequence of one column and renumber it.
//! - Apply the clamping policy for out-of-range positions.
//!
//! # Invariants
//! - Positions are always exactly `1..=len()`, derived from member order.
//! - A member appears at most once.
//! - Failed operations leave the sequence untouched.
//!
//! Persistence loads a column into an [`OrderedColumn`], mutates it, and
//! writes every member position back inside one transaction.

use std::error::Error;
use std::fmt::{Debug, Display, Formatter};

/// Errors from structural column operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OrderingError<K> {
    /// Member is already part of this column.
    AlreadyMember(K),
    /// Member is not part of this column.
    NotMember(K),
}

impl<K: Debug> Display for OrderingError<K> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::AlreadyMember(id) => write!(f, "{id:?} is already in this column"),
            Self::NotMember(id) => write!(f, "{id:?} is not in this column"),
        }
    }
}

impl<K: Debug> Error for OrderingError<K> {}

/// Position change of one member.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Reposition {
    pub from: u32,
    pub to: u32,
}

/// Ordered members of one column scope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderedColumn<K> {
    scope: K,
    members: Vec<K>,
}

impl<K: Copy + Eq + Debug> OrderedColumn<K> {
    /// Creates an empty column.
    pub fn new(scope: K) -> Self {
        Self {
            scope,
            members: Vec::new(),
        }
    }

    /// Builds a column from members already sorted by position.
    ///
    /// Duplicates keep their first occurrence, so a column loaded from a
    /// damaged store is renumbered into a valid sequence.
    pub fn from_ordered(scope: K, ordered: impl IntoIterator<Item = K>) -> Self {
        let mut column = Self::new(scope);
        for id in ordered {
            if !column.contains(id) {
                column.members.push(id);
            }
        }
        column
    }

    pub fn scope(&self) -> K {
        self.scope
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn contains(&self, id: K) -> bool {
        self.members.contains(&id)
    }

    /// Members in position order.
    pub fn members(&self) -> &[K] {
        &self.members
    }

    /// 1-based position of `id`, if it is a member.
    pub fn position_of(&self, id: K) -> Option<u32> {
        self.members
            .iter()
            .position(|member| *member == id)
            .map(index_to_position)
    }

    /// `(member, position)` pairs in position order.
    pub fn positions(&self) -> impl Iterator<Item = (K, u32)> + '_ {
        self.members
            .iter()
            .enumerate()
            .map(|(index, id)| (*id, index_to_position(index)))
    }

    /// Inserts `id` at `requested`, clamped to `[1, len + 1]`.
    ///
    /// Members at or after the final position shift down by one.
    /// Returns the final position.
    pub fn insert(&mut self, id: K, requested: i64) -> Result<u32, OrderingError<K>> {
        if self.contains(id) {
            return Err(OrderingError::AlreadyMember(id));
        }
        let position = clamp_position(requested, self.members.len() + 1);
        self.members.insert(position_to_index(position), id);
        Ok(position)
    }

    /// Appends `id` at the end. Returns the final position.
    pub fn push(&mut self, id: K) -> Result<u32, OrderingError<K>> {
        self.insert(id, i64::MAX)
    }

    /// Removes `id` and closes the gap. Returns its previous position.
    pub fn remove(&mut self, id: K) -> Result<u32, OrderingError<K>> {
        let index = self
            .members
            .iter()
            .position(|member| *member == id)
            .ok_or(OrderingError::NotMember(id))?;
        self.members.remove(index);
        Ok(index_to_position(index))
    }

    /// Moves `id` to `requested`, clamped to `[1, len]`, keeping the
    /// relative order of every other member.
    pub fn move_within(&mut self, id: K, requested: i64) -> Result<Reposition, OrderingError<K>> {
        let from = self.position_of(id).ok_or(OrderingError::NotMember(id))?;
        let to = clamp_position(requested, self.members.len());
        if from != to {
            let member = self.members.remove(position_to_index(from));
            self.members.insert(position_to_index(to), member);
        }
        Ok(Reposition { from, to })
    }
}

/// Clamps a requested 1-based position into `[1, max]`.
///
/// `max == 0` still yields 1, so an empty column accepts position 1.
pub fn clamp_position(requested: i64, max: usize) -> u32 {
    let upper = u32::try_from(max.max(1)).unwrap_or(u32::MAX);
    requested.clamp(1, i64::from(upper)) as u32
}

/// Whether `positions` is exactly `1..=positions.len()` in any order.
pub fn is_contiguous(positions: &[u32]) -> bool {
    let mut sorted = positions.to_vec();
    sorted.sort_unstable();
    sorted
        .iter()
        .enumerate()
        .all(|(index, position)| *position == index_to_position(index))
}

fn index_to_position(index: usize) -> u32 {
    u32::try_from(index + 1).unwrap_or(u32::MAX)
}

fn position_to_index(position: u32) -> usize {
    position.saturating_sub(1) as usize
}
