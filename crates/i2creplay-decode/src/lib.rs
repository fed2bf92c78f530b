//! I2C decoding from logic analyzer samples: edge detection and the
//! bit/byte/acknowledge state machine.

pub mod edge;
pub mod i2c;
pub mod pins;

pub use edge::Edges;
pub use i2c::{step, Acknowledged, BusState, DecodeStats, Direction, Event, I2cDecoder};
pub use pins::{PinError, PinMap, MAX_PIN};
