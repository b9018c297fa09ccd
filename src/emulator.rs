use std::fmt;

use log::{debug, info, trace};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::{
    config::Config,
    decode::OpCodes,
    display::FrameBuffer,
    error::{Chip8Error, Result},
    keyboard::Keypad,
    memory::{Memory, TypeAddr, PROGRAM_START},
    registers::{IndexRegister, ProgramCounter, Registers, Stack},
    timer::Timers,
};

/// One CHIP-8 machine: memory, registers, call stack, screen, timers and
/// keypad, plus the fetch/decode/execute engine that drives them.
///
/// Instances share nothing, so any number can run side by side.
pub struct Emulator {
    pub regs: Registers,
    pub mem: Memory,
    pub pc: ProgramCounter,
    pub index: IndexRegister,
    pub stack: Stack,
    fb: FrameBuffer,
    timers: Timers,
    keypad: Keypad,
    config: Config,
    rng: StdRng,
}

impl Emulator {
    pub fn new(config: Config) -> Self {
        let rng = match config.rng_seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        Self {
            regs: Registers::new(),
            mem: Memory::new(),
            pc: ProgramCounter::default(),
            index: IndexRegister::default(),
            stack: Stack::new(),
            fb: FrameBuffer::new(),
            timers: Timers::new(),
            keypad: Keypad::new(),
            config,
            rng,
        }
    }

    /// Reset the machine and load `rom` at 0x200. If the ROM does not fit the
    /// current machine is left exactly as it was.
    pub fn load_rom(&mut self, rom: &[u8]) -> Result<()> {
        let mut fresh = Emulator::new(self.config.clone());
        fresh.mem.load(rom, PROGRAM_START as usize)?;
        *self = fresh;
        info!("Loaded ROM [size: {}]", rom.len());
        Ok(())
    }

    pub fn reset(&mut self) {
        *self = Emulator::new(self.config.clone());
    }

    pub fn fetch_decode(&mut self) -> Result<OpCodes> {
        let ins = self.mem.read_word(self.pc.0)?;
        // advance before executing so jump and call targets are absolute
        self.pc.increment();
        Ok(OpCodes::decode_raw(ins))
    }

    /// One fetch/decode/execute cycle.
    ///
    /// An unknown opcode is skipped: the PC stays past it and the error is
    /// returned for reporting. Any other error restores the PC, so a failed
    /// step leaves no trace in the machine state.
    pub fn step(&mut self) -> Result<()> {
        let at = self.pc;
        let operation = self.fetch_decode()?;
        debug!("{:03x}: {:?}", at.0, operation);

        match self.execute_ins(operation) {
            Err(err @ Chip8Error::UnknownOpcode(_)) => Err(err),
            Err(err) => {
                self.pc = at;
                Err(err)
            }
            Ok(()) => {
                trace!("{:?}", self);
                Ok(())
            }
        }
    }

    pub fn execute_ins(&mut self, ins: OpCodes) -> Result<()> {
        match ins {
            OpCodes::Jump(addr) => {
                self.pc.set_addr(addr);
            }
            OpCodes::SetRegister(vx, nn) => {
                self.regs.set_register(vx, nn);
            }
            OpCodes::AddToRegister(vx, nn) => {
                self.regs.add_to_register(vx, nn);
            }
            OpCodes::SetIndexRegister(addr) => self.index.set_addr(addr),
            OpCodes::ClearScreen => {
                self.fb.clear_buffer();
            }
            OpCodes::Display(reg_x, reg_y, height) => {
                let (x, y) = (self.regs.get(reg_x), self.regs.get(reg_y));
                // rows I..I+N, one byte (8 pixels) each
                let sprite = self.mem.slice(self.index.0, height as usize)?;
                self.regs.set_flag(false);
                let collision = self.fb.paint(x, y, sprite);
                self.regs.set_flag(collision);
            }
            OpCodes::PushSubroutine(addr) => {
                // pc already points at the instruction after the call
                self.stack.push(self.pc.0)?;
                self.pc.set_addr(addr);
            }
            OpCodes::PopSubroutine => {
                let addr = self.stack.pop()?;
                self.pc.set_addr(addr);
            }
            OpCodes::CopyRegister(vx, vy) => {
                self.regs.set_register(vx, self.regs.get(vy));
            }
            OpCodes::Or(vx, vy) => {
                self.regs
                    .set_register(vx, self.regs.get(vy) | self.regs.get(vx));
            }
            OpCodes::And(vx, vy) => {
                self.regs
                    .set_register(vx, self.regs.get(vy) & self.regs.get(vx));
            }
            OpCodes::XOr(vx, vy) => {
                self.regs
                    .set_register(vx, self.regs.get(vy) ^ self.regs.get(vx));
            }
            // VF is written last in the ALU ops so that X = F keeps the flag
            OpCodes::Add(vx, vy) => {
                let (x, y) = (self.regs.get(vx), self.regs.get(vy));
                let (sum, carry) = x.overflowing_add(y);
                self.regs.set_register(vx, sum);
                self.regs.set_flag(carry);
            }
            OpCodes::SubtractForward(vx, vy) => {
                let (x, y) = (self.regs.get(vx), self.regs.get(vy));
                self.regs.set_register(vx, x.wrapping_sub(y));
                self.regs.set_flag(x >= y); // no borrow
            }
            OpCodes::SubtractBackward(vx, vy) => {
                let (x, y) = (self.regs.get(vx), self.regs.get(vy));
                self.regs.set_register(vx, y.wrapping_sub(x));
                self.regs.set_flag(y >= x); // no borrow
            }
            OpCodes::LeftShift(vx, vy) => {
                let value = self.shift_source(vx, vy);
                self.regs.set_register(vx, value << 1);
                self.regs.set_flag(value >> 7 == 1);
            }
            OpCodes::RightShift(vx, vy) => {
                let value = self.shift_source(vx, vy);
                self.regs.set_register(vx, value >> 1);
                self.regs.set_flag(value & 1 == 1);
            }
            OpCodes::Random(vx, nn) => {
                let ransuu: u8 = self.rng.gen();
                self.regs.set_register(vx, nn & ransuu);
            }
            OpCodes::JumpWithOffset(addr) => {
                self.pc.set_addr(addr + self.regs.get(0) as TypeAddr);
            }
            OpCodes::AddToIndex(vx) => {
                self.index
                    .set_addr(self.index.0.wrapping_add(self.regs.get(vx) as TypeAddr));
            }
            OpCodes::SkipEqualConstant(vx, nn) => {
                if self.regs.get(vx) == nn {
                    self.pc.increment();
                }
            }
            OpCodes::SkipNotEqualConstant(vx, nn) => {
                if self.regs.get(vx) != nn {
                    self.pc.increment();
                }
            }
            OpCodes::SkipEqualRegister(vx, vy) => {
                if self.regs.get(vx) == self.regs.get(vy) {
                    self.pc.increment();
                }
            }
            OpCodes::SkipNotEqualRegister(vx, vy) => {
                if self.regs.get(vx) != self.regs.get(vy) {
                    self.pc.increment();
                }
            }
            OpCodes::PointChar(vx) => {
                self.index.set_addr(Memory::glyph_addr(self.regs.get(vx)));
            }
            OpCodes::ToDecimal(vx) => {
                let value = self.regs.get(vx);
                let digits = [value / 100, (value / 10) % 10, value % 10];
                self.mem
                    .slice_mut(self.index.0, digits.len())?
                    .copy_from_slice(&digits);
            }
            OpCodes::SkipIfPressed(vx) => {
                if self.keypad.is_pressed(self.regs.get(vx)) {
                    self.pc.increment();
                }
            }
            OpCodes::SkipIfNotPressed(vx) => {
                if !self.keypad.is_pressed(self.regs.get(vx)) {
                    self.pc.increment();
                }
            }
            OpCodes::CopyDelayToRegister(vx) => self.regs.set_register(vx, self.timers.delay),
            OpCodes::CopyRegisterToDelay(vx) => self.timers.delay = self.regs.get(vx),
            OpCodes::CopyRegisterToSound(vx) => self.timers.sound = self.regs.get(vx),
            OpCodes::GetKey(vx) => match self.keypad.first_pressed() {
                Some(key) => self.regs.set_register(vx, key),
                // run this instruction again next tick instead of blocking
                None => self.pc.decrement(),
            },
            OpCodes::LoadRegisterFromMemory(vx) => {
                let count = vx as usize + 1;
                let src = self.mem.slice(self.index.0, count)?;
                for (reg, &byte) in src.iter().enumerate() {
                    self.regs.set_register(reg as u8, byte);
                }
                self.bump_index(count);
            }
            OpCodes::StoreRegisterToMemory(vx) => {
                let count = vx as usize + 1;
                let dst = self.mem.slice_mut(self.index.0, count)?;
                for (reg, byte) in dst.iter_mut().enumerate() {
                    *byte = self.regs.get(reg as u8);
                }
                self.bump_index(count);
            }
            OpCodes::Unknown(code) => return Err(Chip8Error::UnknownOpcode(code)),
        }
        Ok(())
    }

    fn shift_source(&self, vx: u8, vy: u8) -> u8 {
        if self.config.quirks.shift_uses_vy {
            self.regs.get(vy)
        } else {
            self.regs.get(vx)
        }
    }

    fn bump_index(&mut self, count: usize) {
        if self.config.quirks.load_store_increments_index {
            self.index
                .set_addr(self.index.0.wrapping_add(count as TypeAddr));
        }
    }

    /// One 60 Hz timer tick. Returns the beep level for this tick.
    pub fn tick_timers(&mut self) -> bool {
        self.timers.tick()
    }

    pub fn timers(&self) -> Timers {
        self.timers
    }

    pub fn frame_buffer(&self) -> &FrameBuffer {
        &self.fb
    }

    pub fn keypad_mut(&mut self) -> &mut Keypad {
        &mut self.keypad
    }

    pub fn set_keys(&mut self, keys: [bool; 16]) {
        self.keypad.set_all(keys);
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn is_beeping(&self) -> bool {
        self.timers.is_beeping()
    }
}

impl Default for Emulator {
    fn default() -> Self {
        Self::new(Config::default())
    }
}

impl fmt::Debug for Emulator {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("Emulator")
            .field("regs", &self.regs)
            .field("pc", &format_args!("{:03x}", self.pc.0))
            .field("i", &format_args!("{:04x}", self.index.0))
            .field("dt", &format_args!("{:02x}", self.timers.delay))
            .field("st", &format_args!("{:02x}", self.timers.sound))
            .field("stack", &self.stack)
            .finish()
    }
}
