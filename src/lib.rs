// 16 8-bit data registers named V0 to VF
// I -> address register, PC -> program counter (12 bits each)
//
// Stack of return addresses, 16 deep
//
// Delay timer & Sound timer: Count down at 60 times / s until 0
// Beep when sound timer is non-zero
//
// Display res: 64 width, 32 height
//
// 35 opcodes, each are 2 bytes (big-endian)
//      NNN: address
//      NN: 8-bit constant
//      N: 4-bit constant
//      X and Y: 4-bit register identifier

pub mod config;
pub mod decode;
pub mod display;
pub mod emulator;
pub mod error;
pub mod keyboard;
pub mod memory;
pub mod registers;
pub mod scheduler;
pub mod timer;

pub use config::{Config, Quirks};
pub use display::FrameBuffer;
pub use emulator::Emulator;
pub use error::{Chip8Error, Result};
pub use scheduler::{Audio, Renderer, Scheduler};
