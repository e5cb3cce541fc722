//! Minimal geometry types shared by the mesher and the driver.
#![forbid(unsafe_code)]

use core::ops::{Add, AddAssign, Mul, Neg, Sub};

#[derive(Clone, Copy, Debug, Default, PartialEq)]
#[cfg_attr(test, derive(proptest_derive::Arbitrary))]
pub struct Vec3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Vec3 {
    #[inline]
    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    #[inline]
    pub fn dot(self, rhs: Vec3) -> f32 {
        self.x * rhs.x + self.y * rhs.y + self.z * rhs.z
    }

    /// Rotates about the vertical axis by `turns` quarter turns.
    ///
    /// One turn maps (x, z) to (-z, x). Only sign swaps are involved, so the
    /// result is exact for any input and four turns are the identity.
    #[inline]
    pub fn rotate_quarter_turns(self, turns: u8) -> Vec3 {
        match turns & 3 {
            0 => self,
            1 => Vec3::new(-self.z, self.y, self.x),
            2 => Vec3::new(-self.x, self.y, -self.z),
            _ => Vec3::new(self.z, self.y, -self.x),
        }
    }

    /// Quarter-turn yaw rotation around `pivot` instead of the origin.
    #[inline]
    pub fn rotate_quarter_turns_about(self, pivot: Vec3, turns: u8) -> Vec3 {
        (self - pivot).rotate_quarter_turns(turns) + pivot
    }
}

impl Add for Vec3 {
    type Output = Vec3;
    #[inline]
    fn add(self, rhs: Vec3) -> Vec3 {
        Vec3::new(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z)
    }
}

impl AddAssign for Vec3 {
    #[inline]
    fn add_assign(&mut self, rhs: Vec3) {
        self.x += rhs.x;
        self.y += rhs.y;
        self.z += rhs.z;
    }
}

impl Sub for Vec3 {
    type Output = Vec3;
    #[inline]
    fn sub(self, rhs: Vec3) -> Vec3 {
        Vec3::new(self.x - rhs.x, self.y - rhs.y, self.z - rhs.z)
    }
}

impl Mul<f32> for Vec3 {
    type Output = Vec3;
    #[inline]
    fn mul(self, rhs: f32) -> Vec3 {
        Vec3::new(self.x * rhs, self.y * rhs, self.z * rhs)
    }
}

impl Neg for Vec3 {
    type Output = Vec3;
    #[inline]
    fn neg(self) -> Vec3 {
        Vec3::new(-self.x, -self.y, -self.z)
    }
}
