pub type BlockId = u8;

/// Brightest value either light channel can hold.
pub const MAX_LIGHT: u8 = 15;

const ID_SHIFT: u32 = 0;
const ID_MASK: u32 = 0xFF;
const SUN_SHIFT: u32 = 8;
const BLOCK_SHIFT: u32 = 12;
const LIGHT_MASK: u32 = 0x0F;
const ORIENT_SHIFT: u32 = 16;
const ORIENT_MASK: u32 = 0x03;

/// Yaw of a placed block. Stored as a 2-bit index; the index is also the
/// number of quarter turns applied when meshing.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum Orientation {
    #[default]
    North = 0,
    East = 1,
    South = 2,
    West = 3,
}

impl Orientation {
    pub const ALL: [Orientation; 4] = [
        Orientation::North,
        Orientation::East,
        Orientation::South,
        Orientation::West,
    ];

    #[inline]
    pub const fn index(self) -> u8 {
        self as u8
    }

    /// Out-of-range input is masked to two bits.
    #[inline]
    pub const fn from_index(i: u8) -> Orientation {
        match i & 3 {
            0 => Orientation::North,
            1 => Orientation::East,
            2 => Orientation::South,
            _ => Orientation::West,
        }
    }

    #[inline]
    pub const fn quarter_turns(self) -> u8 {
        self as u8
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum LightChannel {
    Sun,
    Block,
}

impl LightChannel {
    pub const BOTH: [LightChannel; 2] = [LightChannel::Sun, LightChannel::Block];
}

/// One voxel cell packed into a `u32`.
///
/// Layout (low to high): bits 0-7 block id, 8-11 sunlight, 12-15 blocklight,
/// 16-17 orientation. Remaining bits are always zero. Setters mask their
/// input to the field width, so every constructible word is well formed.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct Voxel(pub u32);

impl Voxel {
    pub const AIR: Voxel = Voxel(0);

    #[inline]
    pub const fn pack(id: BlockId, sunlight: u8, blocklight: u8, orientation: Orientation) -> Voxel {
        Voxel(
            ((id as u32 & ID_MASK) << ID_SHIFT)
                | ((sunlight as u32 & LIGHT_MASK) << SUN_SHIFT)
                | ((blocklight as u32 & LIGHT_MASK) << BLOCK_SHIFT)
                | ((orientation as u32 & ORIENT_MASK) << ORIENT_SHIFT),
        )
    }

    /// Reinterprets a stored word, clearing any bits outside the layout.
    #[inline]
    pub const fn from_raw(raw: u32) -> Voxel {
        Voxel(raw & 0x3_FFFF)
    }

    #[inline]
    pub const fn raw(self) -> u32 {
        self.0
    }

    #[inline]
    pub const fn id(self) -> BlockId {
        ((self.0 >> ID_SHIFT) & ID_MASK) as BlockId
    }

    #[inline]
    pub const fn sunlight(self) -> u8 {
        ((self.0 >> SUN_SHIFT) & LIGHT_MASK) as u8
    }

    #[inline]
    pub const fn blocklight(self) -> u8 {
        ((self.0 >> BLOCK_SHIFT) & LIGHT_MASK) as u8
    }

    #[inline]
    pub const fn orientation(self) -> Orientation {
        Orientation::from_index(((self.0 >> ORIENT_SHIFT) & ORIENT_MASK) as u8)
    }

    /// Exposed light level: the brighter of the two channels.
    #[inline]
    pub const fn light(self) -> u8 {
        let s = self.sunlight();
        let b = self.blocklight();
        if s > b { s } else { b }
    }

    #[inline]
    pub const fn with_id(self, id: BlockId) -> Voxel {
        Voxel((self.0 & !(ID_MASK << ID_SHIFT)) | ((id as u32 & ID_MASK) << ID_SHIFT))
    }

    #[inline]
    pub const fn with_sunlight(self, v: u8) -> Voxel {
        Voxel((self.0 & !(LIGHT_MASK << SUN_SHIFT)) | ((v as u32 & LIGHT_MASK) << SUN_SHIFT))
    }

    #[inline]
    pub const fn with_blocklight(self, v: u8) -> Voxel {
        Voxel((self.0 & !(LIGHT_MASK << BLOCK_SHIFT)) | ((v as u32 & LIGHT_MASK) << BLOCK_SHIFT))
    }

    #[inline]
    pub const fn with_orientation(self, o: Orientation) -> Voxel {
        Voxel((self.0 & !(ORIENT_MASK << ORIENT_SHIFT)) | ((o as u32 & ORIENT_MASK) << ORIENT_SHIFT))
    }

    #[inline]
    pub const fn light_in(self, ch: LightChannel) -> u8 {
        match ch {
            LightChannel::Sun => self.sunlight(),
            LightChannel::Block => self.blocklight(),
        }
    }

    #[inline]
    pub const fn with_light_in(self, ch: LightChannel, v: u8) -> Voxel {
        match ch {
            LightChannel::Sun => self.with_sunlight(v),
            LightChannel::Block => self.with_blocklight(v),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn orientation() -> impl Strategy<Value = Orientation> {
        (0u8..4).prop_map(Orientation::from_index)
    }

    proptest! {
        #[test]
        fn pack_unpack_exact(id in any::<u8>(), sun in 0u8..=15, blk in 0u8..=15, o in orientation()) {
            let v = Voxel::pack(id, sun, blk, o);
            prop_assert_eq!(v.id(), id);
            prop_assert_eq!(v.sunlight(), sun);
            prop_assert_eq!(v.blocklight(), blk);
            prop_assert_eq!(v.orientation(), o);
            prop_assert_eq!(v.light(), sun.max(blk));
        }

        #[test]
        fn setters_touch_only_their_field(raw in 0u32..0x4_0000, sun in any::<u8>(), blk in any::<u8>()) {
            let v = Voxel::from_raw(raw);
            let s = v.with_sunlight(sun);
            prop_assert_eq!(s.id(), v.id());
            prop_assert_eq!(s.blocklight(), v.blocklight());
            prop_assert_eq!(s.orientation(), v.orientation());
            prop_assert_eq!(s.sunlight(), sun & 0x0F);
            let b = v.with_blocklight(blk);
            prop_assert_eq!(b.sunlight(), v.sunlight());
            prop_assert_eq!(b.blocklight(), blk & 0x0F);
        }
    }

    #[test]
    fn out_of_range_light_is_masked() {
        let v = Voxel::pack(3, 0x1F, 0xF0, Orientation::West);
        assert_eq!(v.sunlight(), 15);
        assert_eq!(v.blocklight(), 0);
        assert_eq!(v.id(), 3);
        assert_eq!(v.orientation(), Orientation::West);
        assert_eq!(Orientation::from_index(6), Orientation::South);
    }

    #[test]
    fn channel_accessors_agree() {
        let v = Voxel::pack(1, 4, 9, Orientation::North);
        assert_eq!(v.light_in(LightChannel::Sun), 4);
        assert_eq!(v.light_in(LightChannel::Block), 9);
        let w = v.with_light_in(LightChannel::Sun, 12);
        assert_eq!(w.sunlight(), 12);
        assert_eq!(w.blocklight(), 9);
    }
}
