//! The bit-packed three-valued vector type.

use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::TvError;
use crate::value::Val3;

const WORD_BITS: usize = 64;

/// A fixed-width three-valued test vector.
///
/// Stored as two bit-planes of `u64` words. Internal invariants:
///
/// - bits beyond the vector width are zero in both planes
/// - the value plane is a subset of the care plane (`X` positions carry a
///   zero value bit)
///
/// Both invariants make `Eq` and `Hash` canonical: two vectors compare equal
/// iff they specify the same positions with the same values.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "TvPlanes", try_from = "TvPlanes")]
pub struct Tv {
    len: usize,
    vals: Vec<u64>,
    cares: Vec<u64>,
}

/// Serialized form of a [`Tv`]: width plus the two raw bit-planes.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TvPlanes {
    /// Vector width in ternary positions.
    pub len: usize,
    /// Value plane, little-endian words.
    pub vals: Vec<u64>,
    /// Care plane, little-endian words.
    pub cares: Vec<u64>,
}

impl Tv {
    /// An all-`X` vector of the given width.
    pub fn all_x(len: usize) -> Self {
        let n = words_for(len);
        Self {
            len,
            vals: vec![0; n],
            cares: vec![0; n],
        }
    }

    /// Vector width in ternary positions.
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    /// True for a zero-width vector.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Read one position.
    ///
    /// # Panics
    ///
    /// Panics if `pos >= self.len()`.
    #[inline]
    pub fn get(&self, pos: usize) -> Val3 {
        assert!(pos < self.len, "position {pos} out of range for width {}", self.len);
        let (w, b) = (pos / WORD_BITS, pos % WORD_BITS);
        if (self.cares[w] >> b) & 1 == 0 {
            Val3::X
        } else if (self.vals[w] >> b) & 1 == 1 {
            Val3::One
        } else {
            Val3::Zero
        }
    }

    /// Iterate over all positions in index order.
    pub fn iter(&self) -> impl Iterator<Item = Val3> + '_ {
        (0..self.len).map(|i| self.get(i))
    }

    /// Number of specified (non-`X`) positions.
    pub fn care_count(&self) -> usize {
        self.cares.iter().map(|w| w.count_ones() as usize).sum()
    }

    /// True when no position is `X`.
    pub fn is_fully_specified(&self) -> bool {
        self.care_count() == self.len
    }

    /// Compatibility check: the vectors agree on every position both of
    /// them specify.
    ///
    /// Reflexive and symmetric, deliberately not transitive: `0X`/`X1` and
    /// `X1`/`1X` are compatible pairs while `0X`/`1X` conflict.
    ///
    /// # Panics
    ///
    /// Panics if the widths differ; vectors of one network share one width.
    pub fn compatible(&self, other: &Tv) -> bool {
        assert_eq!(
            self.len, other.len,
            "compatibility is only defined between vectors of one network"
        );
        self.vals
            .iter()
            .zip(&self.cares)
            .zip(other.vals.iter().zip(&other.cares))
            .all(|((&va, &ca), (&vb, &cb))| (ca & cb) & (va ^ vb) == 0)
    }

    /// Synonym for [`Tv::compatible`].
    #[inline]
    pub fn intersects(&self, other: &Tv) -> bool {
        self.compatible(other)
    }

    /// Merge a set of pairwise-compatible vectors.
    ///
    /// The result specifies the union of the inputs' specified positions and
    /// agrees with every input wherever that input is specified. Positions
    /// no input specifies stay `X`; callers wanting fully-specified patterns
    /// apply [`Tv::random_fill`] afterwards.
    ///
    /// # Errors
    ///
    /// [`TvError::EmptyMerge`] for an empty set, [`TvError::WidthMismatch`]
    /// for mixed widths, and [`TvError::IncompatibleMerge`] when two inputs
    /// conflict on a specified position.
    pub fn merge(vs: &[Tv]) -> Result<Tv, TvError> {
        let (first, rest) = vs.split_first().ok_or(TvError::EmptyMerge)?;
        let mut acc = first.clone();
        for v in rest {
            if v.len != acc.len {
                return Err(TvError::WidthMismatch {
                    expected: acc.len,
                    actual: v.len,
                });
            }
            if let Some(position) = acc.first_conflict(v) {
                return Err(TvError::IncompatibleMerge { position });
            }
            for w in 0..acc.vals.len() {
                acc.vals[w] |= v.vals[w];
                acc.cares[w] |= v.cares[w];
            }
        }
        Ok(acc)
    }

    /// Replace every `X` position with a uniformly random bit.
    ///
    /// The result is fully specified and agrees with `self` on every
    /// position `self` specifies.
    pub fn random_fill<R: Rng + ?Sized>(&self, rng: &mut R) -> Tv {
        let mut out = self.clone();
        let n = out.vals.len();
        for w in 0..n {
            let mask = word_mask(self.len, w);
            let r: u64 = rng.random();
            out.vals[w] |= r & !out.cares[w] & mask;
            out.cares[w] = mask;
        }
        out
    }

    /// The raw `(value, care)` bit-planes.
    pub fn to_planes(&self) -> (Vec<u64>, Vec<u64>) {
        (self.vals.clone(), self.cares.clone())
    }

    /// Rebuild a vector from its width and raw bit-planes.
    ///
    /// The value plane is normalized against the care plane so that
    /// `from_planes` composed with [`Tv::to_planes`] is the identity.
    ///
    /// # Errors
    ///
    /// [`TvError::InvalidPlanes`] when either plane has the wrong word count
    /// or carries bits beyond the declared width.
    pub fn from_planes(len: usize, vals: Vec<u64>, cares: Vec<u64>) -> Result<Tv, TvError> {
        let n = words_for(len);
        if vals.len() != n || cares.len() != n {
            return Err(TvError::InvalidPlanes(format!(
                "width {len} needs {n} words, got {}/{}",
                vals.len(),
                cares.len()
            )));
        }
        for w in 0..n {
            let mask = word_mask(len, w);
            if vals[w] & !mask != 0 || cares[w] & !mask != 0 {
                return Err(TvError::InvalidPlanes(format!(
                    "stray bits beyond width {len} in word {w}"
                )));
            }
        }
        let vals = vals.iter().zip(&cares).map(|(&v, &c)| v & c).collect();
        Ok(Tv { len, vals, cares })
    }

    /// First position where the two vectors conflict, if any.
    fn first_conflict(&self, other: &Tv) -> Option<usize> {
        for w in 0..self.vals.len() {
            let conflict =
                (self.cares[w] & other.cares[w]) & (self.vals[w] ^ other.vals[w]);
            if conflict != 0 {
                return Some(w * WORD_BITS + conflict.trailing_zeros() as usize);
            }
        }
        None
    }
}

impl From<Tv> for TvPlanes {
    fn from(tv: Tv) -> Self {
        TvPlanes {
            len: tv.len,
            vals: tv.vals,
            cares: tv.cares,
        }
    }
}

impl TryFrom<TvPlanes> for Tv {
    type Error = TvError;

    fn try_from(p: TvPlanes) -> Result<Self, Self::Error> {
        Tv::from_planes(p.len, p.vals, p.cares)
    }
}

impl fmt::Display for Tv {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for v in self.iter() {
            write!(f, "{v}")?;
        }
        Ok(())
    }
}

impl fmt::Debug for Tv {
    // Debug renders the ternary string; the raw planes are noise in test
    // output.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Tv({self})")
    }
}

impl FromStr for Tv {
    type Err = TvError;

    /// Parse a ternary string such as `"01X-"`.
    ///
    /// `x`, `X` and `-` all denote don't-care.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut builder = TvBuilder::new(s.len());
        for (i, c) in s.chars().enumerate() {
            let v = match c {
                '0' => Val3::Zero,
                '1' => Val3::One,
                'x' | 'X' | '-' => Val3::X,
                found => return Err(TvError::InvalidCharacter { found, position: i }),
            };
            builder.set(i, v);
        }
        Ok(builder.build())
    }
}

/// Incremental constructor for [`Tv`].
///
/// Starts all-`X`; positions may be assigned in any order and re-assigned
/// before [`TvBuilder::build`].
#[derive(Clone, Debug)]
pub struct TvBuilder {
    tv: Tv,
}

impl TvBuilder {
    /// A builder for a vector of the given width, initially all `X`.
    pub fn new(len: usize) -> Self {
        Self { tv: Tv::all_x(len) }
    }

    /// Assign one position.
    ///
    /// # Panics
    ///
    /// Panics if `pos` is out of range.
    pub fn set(&mut self, pos: usize, v: Val3) -> &mut Self {
        assert!(
            pos < self.tv.len,
            "position {pos} out of range for width {}",
            self.tv.len
        );
        let (w, b) = (pos / WORD_BITS, pos % WORD_BITS);
        match v {
            Val3::X => {
                self.tv.cares[w] &= !(1 << b);
                self.tv.vals[w] &= !(1 << b);
            }
            Val3::Zero => {
                self.tv.cares[w] |= 1 << b;
                self.tv.vals[w] &= !(1 << b);
            }
            Val3::One => {
                self.tv.cares[w] |= 1 << b;
                self.tv.vals[w] |= 1 << b;
            }
        }
        self
    }

    /// Finish construction.
    pub fn build(&self) -> Tv {
        self.tv.clone()
    }
}

#[inline]
fn words_for(len: usize) -> usize {
    len.div_ceil(WORD_BITS)
}

/// Mask of valid bits for word `w` of a vector of width `len`.
#[inline]
fn word_mask(len: usize, w: usize) -> u64 {
    let lo = w * WORD_BITS;
    let hi = len.min(lo + WORD_BITS);
    if hi <= lo {
        0
    } else if hi - lo == WORD_BITS {
        !0
    } else {
        (1u64 << (hi - lo)) - 1
    }
}
