//! Relative specificity of route conditions.
//!
//! # Responsibilities
//! - Define the outcome of comparing two conditions of the same kind
//! - Provide the ordering used to pick one entry among several matches
//!
//! # Design Decisions
//! - Specificity is a partial order: two conditions may be incomparable
//! - Incomparable conditions tie; the caller breaks ties by insertion order
//! - Narrower always beats broader, never the other way round

/// Outcome of ranking condition `a` against condition `b`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Specificity {
    /// `a` is a strict narrowing of `b`.
    MoreSpecific,
    /// `b` is a strict narrowing of `a`.
    LessSpecific,
    /// Both conditions accept the same requests.
    Equal,
    /// Neither generalizes the other.
    Incomparable,
}

impl Specificity {
    /// Derive specificity from the two "generalizes" relations.
    ///
    /// `a_covers_b` means every request accepted by `b` is accepted by `a`.
    pub fn from_coverage(a_covers_b: bool, b_covers_a: bool) -> Self {
        match (a_covers_b, b_covers_a) {
            (true, true) => Specificity::Equal,
            (false, true) => Specificity::MoreSpecific,
            (true, false) => Specificity::LessSpecific,
            (false, false) => Specificity::Incomparable,
        }
    }

    /// Swap the point of view.
    pub fn reverse(self) -> Self {
        match self {
            Specificity::MoreSpecific => Specificity::LessSpecific,
            Specificity::LessSpecific => Specificity::MoreSpecific,
            other => other,
        }
    }

    /// True for `Equal` and `Incomparable`.
    pub fn is_tie(self) -> bool {
        matches!(self, Specificity::Equal | Specificity::Incomparable)
    }
}

/// Conditions that can be ranked against each other.
pub trait Rank {
    /// Rank `self` against `other`.
    fn rank(&self, other: &Self) -> Specificity;
}
