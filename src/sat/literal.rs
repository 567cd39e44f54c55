#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
//! Variables and literals.
//!
//! Every component of the engine is generic over the [`Literal`] trait. A literal
//! has to provide a dense `index()` so that per-literal tables (watch lists,
//! binary watchers) can be plain vectors, and so that the clause arena can store
//! literals as raw `u32` words.

use core::ops::{Neg, Not};
use std::fmt::Debug;
use std::hash::Hash;

/// A boolean variable. Numbering follows DIMACS, so variable `0` is never used by
/// input formulas but is still a valid table slot.
pub type Variable = u32;

pub trait Literal: Copy + Debug + Eq + Hash + Ord + Default + Send + Sync + 'static {
    fn new(var: Variable, polarity: bool) -> Self;
    fn variable(self) -> Variable;

    /// `true` for the positive literal of a variable.
    fn polarity(self) -> bool;

    #[must_use]
    fn negated(self) -> Self;

    /// Dense index, `2 * var` for the positive and `2 * var + 1` for the negative
    /// literal.
    fn index(self) -> usize {
        (self.variable() as usize) * 2 + usize::from(!self.polarity())
    }

    #[must_use]
    fn from_index(index: usize) -> Self {
        let var = Variable::try_from(index / 2).expect("literal index overflowed a variable");
        Self::new(var, index % 2 == 0)
    }

    fn is_negated(self) -> bool {
        !self.polarity()
    }

    #[must_use]
    fn from_i32(value: i32) -> Self {
        debug_assert_ne!(value, 0, "0 is the DIMACS clause terminator, not a literal");
        Self::new(value.unsigned_abs(), value.is_positive())
    }

    fn to_i32(self) -> i32 {
        let var = i32::try_from(self.variable()).expect("variable does not fit a DIMACS literal");
        if self.polarity() { var } else { -var }
    }
}

/// Minisat style encoding: `2 * var` for the positive literal, `2 * var + 1` for
/// the negative one. Negation flips the lowest bit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct DoubleLiteral(u32);

impl Literal for DoubleLiteral {
    fn new(var: Variable, polarity: bool) -> Self {
        Self(var * 2 + u32::from(!polarity))
    }

    fn variable(self) -> Variable {
        self.0 / 2
    }

    fn polarity(self) -> bool {
        self.0 % 2 == 0
    }

    fn negated(self) -> Self {
        Self(self.0 ^ 1)
    }

    fn index(self) -> usize {
        self.0 as usize
    }

    fn from_index(index: usize) -> Self {
        Self(u32::try_from(index).expect("literal index overflowed u32"))
    }
}

/// Polarity stored in the top bit, variable in the lower 31 bits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct PackedLiteral(u32);

impl Literal for PackedLiteral {
    fn new(var: Variable, polarity: bool) -> Self {
        Self(var & 0x7FFF_FFFF | (u32::from(polarity) << 31))
    }

    fn variable(self) -> Variable {
        self.0 & 0x7FFF_FFFF
    }

    fn polarity(self) -> bool {
        (self.0 >> 31) != 0
    }

    fn negated(self) -> Self {
        Self(self.0 ^ 0x8000_0000)
    }
}

impl Neg for DoubleLiteral {
    type Output = Self;

    fn neg(self) -> Self::Output {
        self.negated()
    }
}

impl Not for DoubleLiteral {
    type Output = Self;

    fn not(self) -> Self::Output {
        self.negated()
    }
}

impl Not for PackedLiteral {
    type Output = Self;

    fn not(self) -> Self::Output {
        self.negated()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_literal_neg() {
        assert_eq!(
            PackedLiteral::new(1, false).negated(),
            PackedLiteral::new(1, true)
        );
        assert_eq!(
            PackedLiteral::new(1, true).negated(),
            PackedLiteral::new(1, false)
        );
        assert_eq!(!DoubleLiteral::new(7, true), DoubleLiteral::new(7, false));
        assert_eq!(-DoubleLiteral::new(7, false), DoubleLiteral::new(7, true));
    }

    #[test]
    fn test_negation_is_involution() {
        for v in 0..64 {
            for p in [true, false] {
                let d = DoubleLiteral::new(v, p);
                assert_eq!(d.negated().negated(), d);
                assert_eq!(d.negated().variable(), d.variable());
                let k = PackedLiteral::new(v, p);
                assert_eq!(k.negated().negated(), k);
            }
        }
    }

    #[test]
    fn test_dimacs_conversion() {
        let lit = DoubleLiteral::from_i32(-5);
        assert_eq!(lit.variable(), 5);
        assert!(lit.is_negated());
        assert_eq!(lit.to_i32(), -5);
        assert_eq!(PackedLiteral::from_i32(12).to_i32(), 12);
    }

    #[test]
    fn test_index_is_dense_and_shared() {
        let d = DoubleLiteral::from_i32(3);
        let k = PackedLiteral::from_i32(3);
        assert_eq!(d.index(), 6);
        assert_eq!(k.index(), 6);
        assert_eq!(d.negated().index(), 7);
        assert_eq!(k.negated().index(), 7);
        assert_eq!(DoubleLiteral::from_index(7), d.negated());
        assert_eq!(PackedLiteral::from_index(7), k.negated());
    }
}
