//! The fixed set of variants generated for every upload.

use std::fmt;

/// Edge length of every generated variant, in pixels
pub const VARIANT_SIZE: u32 = 300;

/// Clockwise rotation applied to a variant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Rotation {
    Deg0,
    Deg90,
    Deg180,
    Deg270,
}

impl Rotation {
    pub fn degrees(self) -> u16 {
        match self {
            Rotation::Deg0 => 0,
            Rotation::Deg90 => 90,
            Rotation::Deg180 => 180,
            Rotation::Deg270 => 270,
        }
    }
}

impl fmt::Display for Rotation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}°", self.degrees())
    }
}

/// One output variant: size, rotation, and the suffix appended to its name
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransformDescriptor {
    pub suffix: &'static str,
    pub width: u32,
    pub height: u32,
    pub rotation: Rotation,
}

/// Variants produced for every upload, in response order
pub static CUTE_VARIANTS: [TransformDescriptor; 4] = [
    TransformDescriptor {
        suffix: "_cute1",
        width: VARIANT_SIZE,
        height: VARIANT_SIZE,
        rotation: Rotation::Deg0,
    },
    TransformDescriptor {
        suffix: "_cute2",
        width: VARIANT_SIZE,
        height: VARIANT_SIZE,
        rotation: Rotation::Deg90,
    },
    TransformDescriptor {
        suffix: "_cute3",
        width: VARIANT_SIZE,
        height: VARIANT_SIZE,
        rotation: Rotation::Deg180,
    },
    TransformDescriptor {
        suffix: "_cute4",
        width: VARIANT_SIZE,
        height: VARIANT_SIZE,
        rotation: Rotation::Deg270,
    },
];
