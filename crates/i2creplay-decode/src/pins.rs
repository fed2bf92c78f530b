use thiserror::Error;

/// Highest bit position a sample bitmask may assign to a bus line.
pub const MAX_PIN: u8 = 7;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PinError {
    #[error("{line} bit {bit} is out of range (expected 0..=7)")]
    OutOfRange { line: &'static str, bit: u8 },
}

/// Which bits of a sample bitmask carry SCL and SDA.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PinMap {
    clk: u8,
    sda: u8,
}

impl PinMap {
    pub fn new(clk: u8, sda: u8) -> Result<Self, PinError> {
        if clk > MAX_PIN {
            return Err(PinError::OutOfRange { line: "clock", bit: clk });
        }
        if sda > MAX_PIN {
            return Err(PinError::OutOfRange { line: "data", bit: sda });
        }
        if clk == sda {
            log::warn!("clock and data share bit {clk}; START/STOP can never be seen");
        }
        Ok(Self { clk, sda })
    }

    pub fn clk(&self) -> u8 {
        self.clk
    }

    pub fn sda(&self) -> u8 {
        self.sda
    }

    pub fn clk_mask(&self) -> u32 {
        1 << self.clk
    }

    pub fn sda_mask(&self) -> u32 {
        1 << self.sda
    }
}
