use crate::pins::PinMap;

/// Levels of SCL/SDA in one sample and how they moved since the previous one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Edges {
    pub clk: bool,
    pub sda: bool,
    pub clk_rising: bool,
    pub clk_falling: bool,
    pub sda_rising: bool,
    pub sda_falling: bool,
}

impl Edges {
    pub fn detect(levels: u32, pins: PinMap, last_clk: bool, last_sda: bool) -> Self {
        let clk = levels & pins.clk_mask() != 0;
        let sda = levels & pins.sda_mask() != 0;
        Self {
            clk,
            sda,
            clk_rising: !last_clk && clk,
            clk_falling: last_clk && !clk,
            sda_rising: !last_sda && sda,
            sda_falling: last_sda && !sda,
        }
    }
}
