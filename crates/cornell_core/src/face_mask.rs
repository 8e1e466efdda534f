//! Selection of unit-cube faces.
//!
//! The unit cube has its 8 corners at ±0.5 on each axis. Corner `i` takes
//! x from bit 0, y from bit 1 and z from bit 2 of `i` (set = +0.5), so
//! corner 0 is (-,-,-) and corner 7 is (+,+,+).

use std::fmt;
use std::ops::{BitOr, BitOrAssign};

/// One face of the unit cube.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CubeFace {
    NegativeX,
    PositiveX,
    NegativeY,
    PositiveY,
    NegativeZ,
    PositiveZ,
}

impl CubeFace {
    /// All faces in emission order.
    pub const ALL: [CubeFace; 6] = [
        CubeFace::NegativeX,
        CubeFace::PositiveX,
        CubeFace::NegativeY,
        CubeFace::PositiveY,
        CubeFace::NegativeZ,
        CubeFace::PositiveZ,
    ];

    /// Corner indices of the face quad.
    ///
    /// The winding is part of the contract: `triangle_normal` over
    /// (i0, i1, i2) and over (i0, i2, i3) points out of the cube.
    pub const fn corner_indices(self) -> [usize; 4] {
        match self {
            CubeFace::NegativeX => [0, 4, 6, 2],
            CubeFace::PositiveX => [1, 3, 7, 5],
            CubeFace::NegativeY => [0, 1, 5, 4],
            CubeFace::PositiveY => [2, 6, 7, 3],
            CubeFace::NegativeZ => [0, 2, 3, 1],
            CubeFace::PositiveZ => [4, 5, 7, 6],
        }
    }

    pub const fn mask(self) -> FaceMask {
        FaceMask(1 << self as u8)
    }
}

/// Bitset over the six cube faces, bit 0 = -X through bit 5 = +Z.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct FaceMask(u8);

impl FaceMask {
    pub const EMPTY: FaceMask = FaceMask(0);
    pub const NEGATIVE_X: FaceMask = CubeFace::NegativeX.mask();
    pub const POSITIVE_X: FaceMask = CubeFace::PositiveX.mask();
    pub const NEGATIVE_Y: FaceMask = CubeFace::NegativeY.mask();
    pub const POSITIVE_Y: FaceMask = CubeFace::PositiveY.mask();
    pub const NEGATIVE_Z: FaceMask = CubeFace::NegativeZ.mask();
    pub const POSITIVE_Z: FaceMask = CubeFace::PositiveZ.mask();
    pub const ALL: FaceMask = FaceMask(0b11_1111);

    /// Build from raw bits, dropping anything above bit 5.
    pub const fn from_bits_truncate(bits: u8) -> Self {
        FaceMask(bits & Self::ALL.0)
    }

    pub const fn bits(self) -> u8 {
        self.0
    }

    pub const fn contains(self, other: FaceMask) -> bool {
        self.0 & other.0 == other.0
    }

    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Number of selected faces.
    pub const fn count(self) -> usize {
        self.0.count_ones() as usize
    }

    /// Selected faces in emission order (-X, +X, -Y, +Y, -Z, +Z).
    pub fn faces(self) -> impl Iterator<Item = CubeFace> {
        CubeFace::ALL
            .into_iter()
            .filter(move |face| self.contains(face.mask()))
    }
}

impl BitOr for FaceMask {
    type Output = FaceMask;

    fn bitor(self, rhs: FaceMask) -> FaceMask {
        FaceMask(self.0 | rhs.0)
    }
}

impl BitOrAssign for FaceMask {
    fn bitor_assign(&mut self, rhs: FaceMask) {
        self.0 |= rhs.0;
    }
}

impl From<CubeFace> for FaceMask {
    fn from(face: CubeFace) -> Self {
        face.mask()
    }
}

impl fmt::Debug for FaceMask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.faces()).finish()
    }
}
