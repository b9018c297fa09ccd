use std::fmt;

use crate::error::{Chip8Error, Result};
use crate::memory::{TypeAddr, PROGRAM_START};

pub const VF: u8 = 0xF;
pub const STACK_DEPTH: usize = 16;

const PC_MASK: TypeAddr = 0x0FFF;

// V0..VF, indexed directly by the decoded nibble
#[derive(Clone, Default)]
pub struct Registers {
    registers: [u8; 16],
}

impl Registers {
    pub fn new() -> Self {
        Self { registers: [0; 16] }
    }

    pub fn set_register(&mut self, reg_num: u8, value: u8) {
        self.registers[(reg_num & 0xF) as usize] = value;
    }

    pub fn add_to_register(&mut self, reg_num: u8, value: u8) {
        let current = self.get(reg_num);
        self.set_register(reg_num, current.wrapping_add(value));
    }

    pub fn get(&self, reg_num: u8) -> u8 {
        self.registers[(reg_num & 0xF) as usize]
    }

    pub fn set_flag(&mut self, on: bool) {
        self.set_register(VF, on as u8);
    }
}

impl fmt::Debug for Registers {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let mut dbg = f.debug_struct("Registers");
        for (i, value) in self.registers.iter().enumerate() {
            dbg.field(&format!("V{i:X}"), &format_args!("{value:02x}"));
        }
        dbg.finish()
    }
}

// Special registers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProgramCounter(pub TypeAddr);

impl ProgramCounter {
    pub fn increment(&mut self) {
        self.set_addr(self.0.wrapping_add(2));
    }

    pub fn decrement(&mut self) {
        self.set_addr(self.0.wrapping_sub(2));
    }

    pub fn set_addr(&mut self, addr: TypeAddr) {
        self.0 = addr & PC_MASK;
    }
}

impl Default for ProgramCounter {
    fn default() -> Self {
        Self(PROGRAM_START)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IndexRegister(pub TypeAddr);

impl IndexRegister {
    pub fn set_addr(&mut self, addr: TypeAddr) {
        self.0 = addr;
    }
}

/// Return addresses for CALL/RET, bounded at 16 frames like the original hardware.
#[derive(Debug, Clone, Default)]
pub struct Stack {
    addresses: Vec<TypeAddr>,
}

impl Stack {
    pub fn new() -> Self {
        Self {
            addresses: Vec::with_capacity(STACK_DEPTH),
        }
    }

    pub fn push(&mut self, addr: TypeAddr) -> Result<()> {
        if self.addresses.len() >= STACK_DEPTH {
            return Err(Chip8Error::StackOverflow);
        }
        self.addresses.push(addr);
        Ok(())
    }

    pub fn pop(&mut self) -> Result<TypeAddr> {
        self.addresses.pop().ok_or(Chip8Error::StackUnderflow)
    }

    pub fn depth(&self) -> usize {
        self.addresses.len()
    }
}
