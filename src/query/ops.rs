use std::cmp::Ordering;
use std::ops::{BitAnd, BitOr, BitOrAssign};

/// Query operator flags, with the values of the `ASL_QUERY_OP_*` constants.
///
/// The low three bits select a comparison; the remaining bits are modifiers.
/// Flags combine with `|`, e.g. `QueryOp::SUBSTRING | QueryOp::CASEFOLD`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct QueryOp(u32);

impl QueryOp {
    pub const EQUAL: QueryOp = QueryOp(0x0001);
    pub const GREATER: QueryOp = QueryOp(0x0002);
    pub const GREATER_EQUAL: QueryOp = QueryOp(0x0003);
    pub const LESS: QueryOp = QueryOp(0x0004);
    pub const LESS_EQUAL: QueryOp = QueryOp(0x0005);
    pub const NOT_EQUAL: QueryOp = QueryOp(0x0006);
    pub const TRUE: QueryOp = QueryOp(0x0007);
    pub const CASEFOLD: QueryOp = QueryOp(0x0010);
    pub const PREFIX: QueryOp = QueryOp(0x0020);
    pub const SUFFIX: QueryOp = QueryOp(0x0040);
    pub const SUBSTRING: QueryOp = QueryOp(0x0060);
    pub const NUMERIC: QueryOp = QueryOp(0x0080);
    pub const REGEX: QueryOp = QueryOp(0x0100);

    const COMPARISON_MASK: u32 = 0x0007;

    pub const fn empty() -> Self {
        QueryOp(0)
    }

    /// Keep every bit, including ones without a named constant
    pub const fn from_bits_retain(bits: u32) -> Self {
        QueryOp(bits)
    }

    pub const fn bits(self) -> u32 {
        self.0
    }

    /// Whether every bit of `other` is set in `self`
    pub const fn contains(self, other: QueryOp) -> bool {
        self.0 & other.0 == other.0
    }

    /// The comparison selected by the low bits. Zero compares for equality.
    pub fn comparison(self) -> Comparison {
        match self.0 & Self::COMPARISON_MASK {
            0 | 1 => Comparison::Equal,
            2 => Comparison::Greater,
            3 => Comparison::GreaterEqual,
            4 => Comparison::Less,
            5 => Comparison::LessEqual,
            6 => Comparison::NotEqual,
            _ => Comparison::True,
        }
    }
}

impl BitOr for QueryOp {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self::Output {
        QueryOp(self.0 | rhs.0)
    }
}

impl BitOrAssign for QueryOp {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

impl BitAnd for QueryOp {
    type Output = Self;

    fn bitand(self, rhs: Self) -> Self::Output {
        QueryOp(self.0 & rhs.0)
    }
}

/// Comparison part of a [`QueryOp`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparison {
    Equal,
    Greater,
    GreaterEqual,
    Less,
    LessEqual,
    NotEqual,
    True,
}

impl Comparison {
    /// Whether `actual.cmp(expected)` satisfies this comparison
    pub fn holds(self, ordering: Ordering) -> bool {
        match self {
            Comparison::Equal => ordering == Ordering::Equal,
            Comparison::Greater => ordering == Ordering::Greater,
            Comparison::GreaterEqual => ordering != Ordering::Less,
            Comparison::Less => ordering == Ordering::Less,
            Comparison::LessEqual => ordering != Ordering::Greater,
            Comparison::NotEqual => ordering != Ordering::Equal,
            Comparison::True => true,
        }
    }
}
