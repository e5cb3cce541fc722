use serde::Deserialize;

/// Rendering class of a block. Drives face culling and which index bucket
/// the mesher writes a face into.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MaterialClass {
    #[default]
    Opaque,
    Water,
    /// Foliage and glass: both sides of a face are visible.
    RenderBothSides,
}

impl MaterialClass {
    #[inline]
    pub fn is_water(self) -> bool {
        matches!(self, MaterialClass::Water)
    }

    #[inline]
    pub fn renders_both_sides(self) -> bool {
        matches!(self, MaterialClass::RenderBothSides)
    }
}
