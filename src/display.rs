pub const WIDTH: usize = 64;
pub const HEIGHT: usize = 32;

/// The 64x32 monochrome screen. Cells are 0 or 1; only `clear_buffer` and
/// `paint` change them.
#[derive(Clone, PartialEq, Eq)]
pub struct FrameBuffer {
    bit_buffer: Vec<u8>,
}

impl FrameBuffer {
    pub fn new() -> Self {
        Self {
            bit_buffer: vec![0; WIDTH * HEIGHT],
        }
    }

    pub fn clear_buffer(&mut self) {
        self.bit_buffer.fill(0);
    }

    pub fn get(&self, x: usize, y: usize) -> u8 {
        self.bit_buffer[(y % HEIGHT) * WIDTH + (x % WIDTH)]
    }

    // row-major, WIDTH cells per row
    pub fn cells(&self) -> &[u8] {
        &self.bit_buffer
    }

    pub fn rows(&self) -> impl Iterator<Item = &[u8]> {
        self.bit_buffer.chunks(WIDTH)
    }

    pub fn is_blank(&self) -> bool {
        self.bit_buffer.iter().all(|&bit| bit == 0)
    }

    /// XOR an 8-pixel wide sprite onto the screen with its top-left corner at
    /// (x, y). Coordinates wrap around both edges independently. Returns true
    /// if any lit pixel was switched off.
    pub fn paint(&mut self, x: u8, y: u8, sprite: &[u8]) -> bool {
        let mut vf = false;
        for (i, row) in sprite.iter().enumerate() {
            let ny = (y as usize + i) % HEIGHT;
            for j in 0..8 {
                let bit = (row >> (7 - j)) & 1;
                if bit == 0 {
                    continue;
                }
                let nx = (x as usize + j) % WIDTH;
                let index = ny * WIDTH + nx;
                if self.bit_buffer[index] == 1 {
                    vf = true;
                }
                self.bit_buffer[index] ^= 1;
            }
        }
        vf
    }
}

impl Default for FrameBuffer {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for FrameBuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        for row in self.rows() {
            let line: String = row.iter().map(|&c| if c == 1 { '#' } else { '.' }).collect();
            writeln!(f, "{line}")?;
        }
        Ok(())
    }
}
