//! Host-side stand-ins for the device textures.

use cornell_math::Vec4;
use rand::Rng;

/// Exclusive upper bound of the values in a seed texture.
pub const SEED_RANGE: u32 = 1024 * 1024;

/// A row-major 2D image, row 0 at the top.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Texture2D<T> {
    width: u32,
    height: u32,
    texels: Vec<T>,
}

/// Float RGBA image holding radiance.
pub type RenderTarget = Texture2D<Vec4>;

/// One random `u32` per pixel, offsetting each pixel's Halton index.
pub type SeedTexture = Texture2D<u32>;

impl<T: Copy + Default> Texture2D<T> {
    /// Allocate a texture filled with `T::default()`.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            texels: vec![T::default(); width as usize * height as usize],
        }
    }

    pub fn from_texels(width: u32, height: u32, texels: Vec<T>) -> Option<Self> {
        (texels.len() == width as usize * height as usize).then_some(Self {
            width,
            height,
            texels,
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn len(&self) -> usize {
        self.texels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.texels.is_empty()
    }

    #[inline]
    pub fn get(&self, x: u32, y: u32) -> T {
        self.texels[(y * self.width + x) as usize]
    }

    #[inline]
    pub fn set(&mut self, x: u32, y: u32, value: T) {
        let index = (y * self.width + x) as usize;
        self.texels[index] = value;
    }

    pub fn texels(&self) -> &[T] {
        &self.texels
    }

    pub fn texels_mut(&mut self) -> &mut [T] {
        &mut self.texels
    }

    pub fn fill(&mut self, value: T) {
        self.texels.fill(value);
    }
}

impl SeedTexture {
    /// Seeds drawn uniformly from `[0, SEED_RANGE)`.
    pub fn random<R: Rng>(width: u32, height: u32, rng: &mut R) -> Self {
        let texels = (0..width as usize * height as usize)
            .map(|_| rng.gen_range(0..SEED_RANGE))
            .collect();
        Self {
            width,
            height,
            texels,
        }
    }
}

/// Handle to one of the frame resources' float textures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TextureId(pub usize);

/// Two handles where one is read and the other written, swapped after use.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PingPong<T> {
    front: T,
    back: T,
}

impl<T: Copy> PingPong<T> {
    pub fn new(front: T, back: T) -> Self {
        Self { front, back }
    }

    /// Most recently written handle.
    pub fn front(&self) -> T {
        self.front
    }

    /// Handle the next pass writes to.
    pub fn back(&self) -> T {
        self.back
    }

    pub fn swap(&mut self) {
        std::mem::swap(&mut self.front, &mut self.back);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_row_major_access() {
        let mut tex: Texture2D<u32> = Texture2D::new(3, 2);
        tex.set(2, 1, 7);

        assert_eq!(tex.texels()[5], 7);
        assert_eq!(tex.get(2, 1), 7);
        assert_eq!(tex.size(), (3, 2));
        assert_eq!(tex.len(), 6);
    }

    #[test]
    fn test_from_texels_checks_length() {
        assert!(Texture2D::from_texels(2, 2, vec![0u32; 4]).is_some());
        assert!(Texture2D::from_texels(2, 2, vec![0u32; 3]).is_none());
    }

    #[test]
    fn test_seed_range() {
        let mut rng = StdRng::seed_from_u64(3);
        let seeds = SeedTexture::random(64, 64, &mut rng);

        assert_eq!(seeds.len(), 4096);
        assert!(seeds.texels().iter().all(|&s| s < SEED_RANGE));
        // Not all the same value
        assert!(seeds.texels().iter().any(|&s| s != seeds.texels()[0]));
    }

    #[test]
    fn test_ping_pong_swap() {
        let mut pair = PingPong::new(TextureId(0), TextureId(1));
        assert_eq!((pair.front(), pair.back()), (TextureId(0), TextureId(1)));

        pair.swap();
        assert_eq!((pair.front(), pair.back()), (TextureId(1), TextureId(0)));

        pair.swap();
        assert_eq!(pair.front(), TextureId(0));
    }
}
