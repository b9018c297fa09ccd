use crate::memory::TypeAddr;

// 16-bit instruction word split into its nibble fields:
//   F000 family, 0F00 x, 00F0 y, 000F n, 00FF nn, 0FFF nnn
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawInstruction {
    code: u16,
}

impl RawInstruction {
    pub fn new(code: u16) -> Self {
        RawInstruction { code }
    }

    pub fn family(self) -> u8 {
        (self.code >> 12) as u8
    }

    pub fn x(self) -> u8 {
        ((self.code >> 8) & 0xF) as u8
    }

    pub fn y(self) -> u8 {
        ((self.code >> 4) & 0xF) as u8
    }

    pub fn n(self) -> u8 {
        (self.code & 0xF) as u8
    }

    pub fn nn(self) -> u8 {
        (self.code & 0xFF) as u8
    }

    pub fn nnn(self) -> TypeAddr {
        self.code & 0x0FFF
    }
}

impl PartialEq<u16> for RawInstruction {
    fn eq(&self, ins: &u16) -> bool {
        ins.eq(&self.code)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpCodes {
    ClearScreen,               // 00E0  all cells off
    Jump(TypeAddr),            // 1NNN  PC = NNN
    SetRegister(u8, u8),       // 6XNN  VX = NN
    AddToRegister(u8, u8),     // 7XNN  VX += NN, wraps, VF untouched
    SetIndexRegister(TypeAddr), // ANNN  I = NNN
    // DXYN: XOR an N row sprite from [I] onto the screen at (VX, VY),
    // VF = 1 if any lit pixel went dark
    Display(u8, u8, u8),

    PushSubroutine(TypeAddr), // 2NNN  push PC, PC = NNN
    PopSubroutine,            // 00EE  PC = pop

    SkipEqualConstant(u8, u8),    // 3XNN
    SkipNotEqualConstant(u8, u8), // 4XNN
    SkipEqualRegister(u8, u8),    // 5XY0
    SkipNotEqualRegister(u8, u8), // 9XY0

    // 8XYn ALU, VF carries the flag where there is one
    CopyRegister(u8, u8),     // 8XY0  VX = VY
    Or(u8, u8),               // 8XY1
    And(u8, u8),              // 8XY2
    XOr(u8, u8),              // 8XY3
    Add(u8, u8),              // 8XY4  VF = carry
    SubtractForward(u8, u8),  // 8XY5  VX = VX - VY, VF = !borrow
    SubtractBackward(u8, u8), // 8XY7  VX = VY - VX, VF = !borrow
    LeftShift(u8, u8),        // 8XYE  VF = bit shifted out
    RightShift(u8, u8),       // 8XY6  VF = bit shifted out

    JumpWithOffset(TypeAddr), // BNNN  PC = NNN + V0
    Random(u8, u8),           // CXNN  VX = rand & NN

    SkipIfPressed(u8),    // EX9E
    SkipIfNotPressed(u8), // EXA1

    CopyDelayToRegister(u8), // FX07
    CopyRegisterToDelay(u8), // FX15
    CopyRegisterToSound(u8), // FX18

    AddToIndex(u8), // FX1E
    GetKey(u8),     // FX0A  re-runs until a key is down
    PointChar(u8),  // FX29  I = glyph for low nibble of VX
    ToDecimal(u8),  // FX33  BCD of VX at I, I+1, I+2

    LoadRegisterFromMemory(u8), // FX65  V0..=VX = [I..]
    StoreRegisterToMemory(u8),  // FX55  [I..] = V0..=VX

    // anything else, carries the raw word for reporting
    Unknown(u16),
}

impl OpCodes {
    /// Dispatch on the leading nibble first; families that share a nibble
    /// are told apart by the full word (`0...`) or by their low bits.
    pub fn decode_raw(ins: u16) -> Self {
        let raw = RawInstruction::new(ins);
        let (x, y) = (raw.x(), raw.y());

        match raw.family() {
            0x0 => match ins {
                0x00E0 => Self::ClearScreen,
                0x00EE => Self::PopSubroutine,
                _ => Self::Unknown(ins),
            },
            0x1 => Self::Jump(raw.nnn()),
            0x2 => Self::PushSubroutine(raw.nnn()),
            0x3 => Self::SkipEqualConstant(x, raw.nn()),
            0x4 => Self::SkipNotEqualConstant(x, raw.nn()),
            0x5 if raw.n() == 0 => Self::SkipEqualRegister(x, y),
            0x6 => Self::SetRegister(x, raw.nn()),
            0x7 => Self::AddToRegister(x, raw.nn()),
            0x8 => match raw.n() {
                0x0 => Self::CopyRegister(x, y),
                0x1 => Self::Or(x, y),
                0x2 => Self::And(x, y),
                0x3 => Self::XOr(x, y),
                0x4 => Self::Add(x, y),
                0x5 => Self::SubtractForward(x, y),
                0x6 => Self::RightShift(x, y),
                0x7 => Self::SubtractBackward(x, y),
                0xE => Self::LeftShift(x, y),
                _ => Self::Unknown(ins),
            },
            0x9 if raw.n() == 0 => Self::SkipNotEqualRegister(x, y),
            0xA => Self::SetIndexRegister(raw.nnn()),
            0xB => Self::JumpWithOffset(raw.nnn()),
            0xC => Self::Random(x, raw.nn()),
            0xD => Self::Display(x, y, raw.n()),
            0xE => match raw.nn() {
                0x9E => Self::SkipIfPressed(x),
                0xA1 => Self::SkipIfNotPressed(x),
                _ => Self::Unknown(ins),
            },
            0xF => match raw.nn() {
                0x07 => Self::CopyDelayToRegister(x),
                0x0A => Self::GetKey(x),
                0x15 => Self::CopyRegisterToDelay(x),
                0x18 => Self::CopyRegisterToSound(x),
                0x1E => Self::AddToIndex(x),
                0x29 => Self::PointChar(x),
                0x33 => Self::ToDecimal(x),
                0x55 => Self::StoreRegisterToMemory(x),
                0x65 => Self::LoadRegisterFromMemory(x),
                _ => Self::Unknown(ins),
            },
            _ => Self::Unknown(ins),
        }
    }
}
