use thiserror::Error;

pub type Result<T> = std::result::Result<T, Chip8Error>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Chip8Error {
    #[error("{len} bytes at {offset:#05X} do not fit in memory")]
    OutOfBounds { offset: usize, len: usize },

    #[error("invalid memory address {0:#06X}")]
    InvalidAddress(u16),

    #[error("unknown opcode {0:#06X}")]
    UnknownOpcode(u16),

    #[error("call stack overflow")]
    StackOverflow,

    #[error("return with empty call stack")]
    StackUnderflow,
}

impl Chip8Error {
    /// Memory faults halt the machine; everything else is reported and skipped over.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Chip8Error::OutOfBounds { .. } | Chip8Error::InvalidAddress(_)
        )
    }
}
