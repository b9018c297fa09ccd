use crate::error::{Chip8Error, Result};

pub type TypeAddr = u16; // in reality u12
type FontBytes = [u8; GLYPH_SIZE * 16];

pub const MEMORY_SIZE: usize = 4096;
// 000 -> 1FF is reserved for the interpreter, fonts live in the middle of it
pub const FONT_START: TypeAddr = 0x050;
pub const PROGRAM_START: TypeAddr = 0x200;
pub const GLYPH_SIZE: usize = 5;

const DEFAULT_FONT: FontBytes = [
    0xF0, 0x90, 0x90, 0x90, 0xF0, // 0
    0x20, 0x60, 0x20, 0x20, 0x70, // 1
    0xF0, 0x10, 0xF0, 0x80, 0xF0, // 2
    0xF0, 0x10, 0xF0, 0x10, 0xF0, // 3
    0x90, 0x90, 0xF0, 0x10, 0x10, // 4
    0xF0, 0x80, 0xF0, 0x10, 0xF0, // 5
    0xF0, 0x80, 0xF0, 0x90, 0xF0, // 6
    0xF0, 0x10, 0x20, 0x40, 0x40, // 7
    0xF0, 0x90, 0xF0, 0x90, 0xF0, // 8
    0xF0, 0x90, 0xF0, 0x10, 0xF0, // 9
    0xF0, 0x90, 0xF0, 0x90, 0x90, // A
    0xE0, 0x90, 0xE0, 0x90, 0xE0, // B
    0xF0, 0x80, 0x80, 0x80, 0xF0, // C
    0xE0, 0x90, 0x90, 0x90, 0xE0, // D
    0xF0, 0x80, 0xF0, 0x80, 0xF0, // E
    0xF0, 0x80, 0xF0, 0x80, 0x80, // F
];

struct Font {
    data: FontBytes,
}

impl Default for Font {
    fn default() -> Self {
        Self { data: DEFAULT_FONT }
    }
}

impl Font {
    fn glyph_addr(digit: u8) -> TypeAddr {
        FONT_START + (digit & 0xF) as TypeAddr * GLYPH_SIZE as TypeAddr
    }
}

/// Flat 4K address space. Every access is bounds checked.
#[derive(Clone)]
pub struct Memory {
    bytes: [u8; MEMORY_SIZE],
}

impl Memory {
    /// Zeroed memory with the hex font written at `FONT_START`.
    pub fn new() -> Self {
        let mut mem = Self {
            bytes: [0; MEMORY_SIZE],
        };
        let font = Font::default();
        let start = FONT_START as usize;
        mem.bytes[start..start + font.data.len()].copy_from_slice(&font.data);
        mem
    }

    pub fn glyph_addr(digit: u8) -> TypeAddr {
        Font::glyph_addr(digit)
    }

    // nothing is written unless the whole sequence fits
    pub fn load(&mut self, bytes: &[u8], offset: usize) -> Result<()> {
        let end = offset
            .checked_add(bytes.len())
            .filter(|end| *end <= MEMORY_SIZE)
            .ok_or(Chip8Error::OutOfBounds {
                offset,
                len: bytes.len(),
            })?;
        self.bytes[offset..end].copy_from_slice(bytes);
        Ok(())
    }

    pub fn read(&self, addr: TypeAddr) -> Result<u8> {
        self.bytes
            .get(addr as usize)
            .copied()
            .ok_or(Chip8Error::InvalidAddress(addr))
    }

    pub fn write(&mut self, addr: TypeAddr, val: u8) -> Result<()> {
        let byte = self
            .bytes
            .get_mut(addr as usize)
            .ok_or(Chip8Error::InvalidAddress(addr))?;
        *byte = val;
        Ok(())
    }

    // big-endian, high byte first
    pub fn read_word(&self, addr: TypeAddr) -> Result<u16> {
        let hi = self.read(addr)?;
        let lo = self.read(addr.wrapping_add(1))?;
        Ok(u16::from_be_bytes([hi, lo]))
    }

    pub fn slice(&self, addr: TypeAddr, len: usize) -> Result<&[u8]> {
        let start = addr as usize;
        self.bytes
            .get(start..start + len)
            .ok_or(Chip8Error::OutOfBounds { offset: start, len })
    }

    pub fn slice_mut(&mut self, addr: TypeAddr, len: usize) -> Result<&mut [u8]> {
        let start = addr as usize;
        self.bytes
            .get_mut(start..start + len)
            .ok_or(Chip8Error::OutOfBounds { offset: start, len })
    }
}

impl Default for Memory {
    fn default() -> Self {
        Self::new()
    }
}
