use fastnoise_lite::{FastNoiseLite, NoiseType};

use crate::voxel::VoxelPos;

/// Seeded Perlin field remapped to `[0, 1]`, sampled the way terrain rules
/// expect: 2D samples are scaled per chunk width, 3D tests average six
/// axis-pair 2D samples.
pub struct PerlinField {
    noise: FastNoiseLite,
    chunk_width: f32,
}

impl PerlinField {
    pub fn new(seed: i32, chunk_width: i32) -> Self {
        let mut noise = FastNoiseLite::with_seed(seed);
        noise.set_noise_type(Some(NoiseType::Perlin));
        noise.set_frequency(Some(1.0));
        Self {
            noise,
            chunk_width: chunk_width as f32,
        }
    }

    #[inline]
    fn unit(&self, a: f32, b: f32) -> f32 {
        ((self.noise.get_noise_2d(a, b) + 1.0) * 0.5).clamp(0.0, 1.0)
    }

    /// Column noise in `[0, 1]`.
    pub fn get_2d(&self, x: i32, z: i32, offset: f32, scale: f32) -> f32 {
        let sx = (x as f32 + offset + 0.1) / self.chunk_width * scale;
        let sz = (z as f32 + offset + 0.1) / self.chunk_width * scale;
        self.unit(sx, sz)
    }

    /// Threshold test over the mean of the six ordered axis pairs.
    pub fn get_3d(&self, p: VoxelPos, offset: f32, scale: f32, threshold: f32) -> bool {
        let x = (p.x as f32 + offset + 0.1) * scale;
        let y = (p.y as f32 + offset + 0.1) * scale;
        let z = (p.z as f32 + offset + 0.1) * scale;
        let ab = self.unit(x, y);
        let bc = self.unit(y, z);
        let ac = self.unit(x, z);
        let ba = self.unit(y, x);
        let cb = self.unit(z, y);
        let ca = self.unit(z, x);
        (ab + bc + ac + ba + cb + ca) / 6.0 > threshold
    }
}
