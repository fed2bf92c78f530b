//! I2C bit/byte state machine driven by per-sample SCL/SDA edges.
//!
//! Decoding is a pure step `(BusState, Edges) -> (BusState, Option<Event>)`;
//! [`I2cDecoder`] threads that step over a stream of sample bitmasks.

use crate::edge::Edges;
use crate::pins::PinMap;
use log::{debug, trace};
use serde::Serialize;

/// R/W bit of an address byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Write,
    Read,
}

impl Direction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Write => "Write",
            Direction::Read => "Read",
        }
    }
}

/// The byte that an ACK/NACK slot acknowledges.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "phase", rename_all = "snake_case")]
pub enum Acknowledged {
    Address { address: u8, direction: Direction },
    Data { value: u8 },
}

impl Acknowledged {
    fn decode(value: u8, address_phase: bool) -> Self {
        if address_phase {
            Acknowledged::Address {
                address: value >> 1,
                direction: if value & 1 == 1 { Direction::Read } else { Direction::Write },
            }
        } else {
            Acknowledged::Data { value }
        }
    }
}

/// Protocol event recognized on a single sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum Event {
    Start,
    /// One data bit, 0 or 1.
    Bit(u8),
    Ack(Acknowledged),
    Nack(Acknowledged),
    Stop,
}

/// Bus state carried from one sample to the next.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BusState {
    pub last_clk: bool,
    pub last_sda: bool,
    /// Bits still to receive in the current byte, 8 down to 0.
    /// At 0 the next clock rise is the ACK/NACK slot.
    pub bits_remaining: u8,
    pub value: u8,
    pub address_phase: bool,
}

impl Default for BusState {
    /// Idle bus: both lines pulled high, no byte in progress.
    ///
    /// A clock rise seen before any START lands in the ACK/NACK slot of an
    /// empty byte.
    fn default() -> Self {
        Self {
            last_clk: true,
            last_sda: true,
            bits_remaining: 0,
            value: 0,
            address_phase: false,
        }
    }
}

impl BusState {
    fn begin_byte(&mut self) {
        self.value = 0;
        self.bits_remaining = 8;
    }
}

/// Advance the bus state by one sample.
///
/// The START, clock-rise and STOP rules each need a distinct edge pattern,
/// so at most one of them fires.
pub fn step(mut state: BusState, edges: &Edges) -> (BusState, Option<Event>) {
    let clk_held_high = edges.clk && state.last_clk;
    let mut event = None;

    if edges.sda_falling && clk_held_high {
        state.begin_byte();
        state.address_phase = true;
        event = Some(Event::Start);
    } else if edges.clk_rising {
        if edges.sda && state.last_sda {
            event = Some(if state.bits_remaining > 0 {
                state.bits_remaining -= 1;
                state.value |= 1 << state.bits_remaining;
                Event::Bit(1)
            } else {
                // NACK leaves the byte and phase untouched.
                Event::Nack(Acknowledged::decode(state.value, state.address_phase))
            });
        } else if !edges.sda && !state.last_sda {
            event = Some(if state.bits_remaining > 0 {
                state.bits_remaining -= 1;
                Event::Bit(0)
            } else {
                let ack = Acknowledged::decode(state.value, state.address_phase);
                state.begin_byte();
                state.address_phase = false;
                Event::Ack(ack)
            });
        }
    } else if edges.sda_rising && clk_held_high {
        event = Some(Event::Stop);
    }

    state.last_clk = edges.clk;
    state.last_sda = edges.sda;
    (state, event)
}

/// Running totals for one decode pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DecodeStats {
    pub samples: u64,
    pub starts: u64,
    pub stops: u64,
    pub bits: u64,
    pub acks: u64,
    pub nacks: u64,
    /// Clock rises where SDA changed across the edge; these produce no event.
    pub glitches: u64,
}

impl DecodeStats {
    fn record(&mut self, edges: &Edges, event: Option<&Event>) {
        self.samples += 1;
        match event {
            Some(Event::Start) => self.starts += 1,
            Some(Event::Stop) => self.stops += 1,
            Some(Event::Bit(_)) => self.bits += 1,
            Some(Event::Ack(_)) => self.acks += 1,
            Some(Event::Nack(_)) => self.nacks += 1,
            None if edges.clk_rising => self.glitches += 1,
            None => {}
        }
    }
}

/// Streaming I2C decoder over sample bitmasks.
pub struct I2cDecoder {
    pins: PinMap,
    state: BusState,
    stats: DecodeStats,
}

impl I2cDecoder {
    pub fn new(pins: PinMap) -> Self {
        Self {
            pins,
            state: BusState::default(),
            stats: DecodeStats::default(),
        }
    }

    /// Decode one sample's pin levels.
    pub fn feed(&mut self, levels: u32) -> Option<Event> {
        let edges = Edges::detect(levels, self.pins, self.state.last_clk, self.state.last_sda);
        let (state, event) = step(self.state, &edges);
        self.state = state;
        self.stats.record(&edges, event.as_ref());

        match event {
            Some(ev @ (Event::Start | Event::Stop)) => {
                debug!("{ev:?} at sample {}", self.stats.samples)
            }
            None if edges.clk_rising => debug!(
                "SDA moved across clock rise at sample {}, no bit taken",
                self.stats.samples
            ),
            _ => trace!("levels={levels:#04x} event={event:?}"),
        }
        event
    }

    pub fn state(&self) -> &BusState {
        &self.state
    }

    pub fn stats(&self) -> &DecodeStats {
        &self.stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CLK: u32 = 0b01;
    const SDA: u32 = 0b10;

    fn decoder() -> I2cDecoder {
        I2cDecoder::new(PinMap::new(0, 1).unwrap())
    }

    /// Samples that clock one bit out: lower SCL, set SDA, raise SCL.
    fn bit_samples(bit: bool) -> [u32; 3] {
        let sda = if bit { SDA } else { 0 };
        [sda, sda, CLK | sda]
    }

    /// Drive a START from idle, returning the events of those samples.
    fn start(dec: &mut I2cDecoder) -> Vec<Option<Event>> {
        vec![dec.feed(CLK | SDA), dec.feed(CLK)]
    }

    /// Clock out `byte` MSB first, returning only the events on clock rises.
    fn send_byte(dec: &mut I2cDecoder, byte: u8) -> Vec<Option<Event>> {
        let mut events = Vec::new();
        for i in (0..8).rev() {
            let [a, b, c] = bit_samples(byte & (1 << i) != 0);
            assert_eq!(dec.feed(a), None);
            assert_eq!(dec.feed(b), None);
            events.push(dec.feed(c));
        }
        events
    }

    fn ack_slot(dec: &mut I2cDecoder, ack: bool) -> Option<Event> {
        let [a, b, c] = bit_samples(!ack);
        dec.feed(a);
        dec.feed(b);
        dec.feed(c)
    }

    #[test]
    fn initial_state_is_idle_bus() {
        let state = BusState::default();
        assert!(state.last_clk && state.last_sda);
        assert_eq!(state.bits_remaining, 0);
        assert_eq!(state.value, 0);
        assert!(!state.address_phase);
    }

    #[test]
    fn start_resets_byte_and_enters_address_phase() {
        let mut dec = decoder();
        assert_eq!(start(&mut dec), vec![None, Some(Event::Start)]);
        assert_eq!(dec.state().bits_remaining, 8);
        assert_eq!(dec.state().value, 0);
        assert!(dec.state().address_phase);
    }

    #[test]
    fn start_needs_clock_high_before_and_after() {
        let state = BusState { last_clk: false, ..BusState::default() };
        let edges = Edges::detect(CLK, PinMap::new(0, 1).unwrap(), false, true);
        let (_, event) = step(state, &edges);
        assert_ne!(event, Some(Event::Start));
    }

    #[test]
    fn stop_needs_clock_high_before_and_after() {
        let mut dec = decoder();
        start(&mut dec);
        // SCL and SDA both low, then both rise in the same sample.
        dec.feed(0);
        assert_ne!(dec.feed(CLK | SDA), Some(Event::Stop));
        assert_eq!(dec.stats().stops, 0);

        // Same edges through the pure step.
        let state = BusState { last_clk: false, last_sda: false, ..BusState::default() };
        let edges = Edges::detect(CLK | SDA, PinMap::new(0, 1).unwrap(), false, false);
        assert!(edges.sda_rising);
        let (_, event) = step(state, &edges);
        assert_ne!(event, Some(Event::Stop));
    }

    #[test]
    fn reconstructs_address_byte_msb_first() {
        let mut dec = decoder();
        start(&mut dec);
        let events = send_byte(&mut dec, 0xA5);
        let bits: Vec<_> = events
            .into_iter()
            .map(|e| match e {
                Some(Event::Bit(b)) => b,
                other => panic!("expected a bit, got {other:?}"),
            })
            .collect();
        assert_eq!(bits, vec![1, 0, 1, 0, 0, 1, 0, 1]);
        assert_eq!(dec.state().value, 0xA5);
        assert_eq!(dec.state().bits_remaining, 0);
    }

    #[test]
    fn ack_decodes_address_and_direction() {
        let mut dec = decoder();
        start(&mut dec);
        send_byte(&mut dec, (0x3C << 1) | 1);
        assert_eq!(
            ack_slot(&mut dec, true),
            Some(Event::Ack(Acknowledged::Address {
                address: 0x3C,
                direction: Direction::Read,
            }))
        );
        assert_eq!(dec.state().bits_remaining, 8);
        assert_eq!(dec.state().value, 0);
        assert!(!dec.state().address_phase);
    }

    #[test]
    fn data_byte_after_address_ack() {
        let mut dec = decoder();
        start(&mut dec);
        send_byte(&mut dec, 0x50 << 1);
        ack_slot(&mut dec, true);
        send_byte(&mut dec, 0x7F);
        assert_eq!(
            ack_slot(&mut dec, true),
            Some(Event::Ack(Acknowledged::Data { value: 0x7F }))
        );
    }

    #[test]
    fn nack_keeps_byte_and_phase() {
        let mut dec = decoder();
        start(&mut dec);
        send_byte(&mut dec, 0x42 << 1);
        assert_eq!(
            ack_slot(&mut dec, false),
            Some(Event::Nack(Acknowledged::Address {
                address: 0x42,
                direction: Direction::Write,
            }))
        );
        assert_eq!(dec.state().bits_remaining, 0);
        assert_eq!(dec.state().value, 0x84);
        assert!(dec.state().address_phase);

        // The slot stays open, so the next high clock is another NACK.
        assert!(matches!(ack_slot(&mut dec, false), Some(Event::Nack(_))));
    }

    #[test]
    fn stop_leaves_state_alone() {
        let mut dec = decoder();
        start(&mut dec);
        send_byte(&mut dec, 0x10);
        ack_slot(&mut dec, true);
        // SCL low with SDA low, SCL high, then SDA released.
        dec.feed(0);
        dec.feed(CLK);
        let before = *dec.state();
        assert_eq!(dec.feed(CLK | SDA), Some(Event::Stop));
        assert_eq!(dec.state().bits_remaining, before.bits_remaining);
        assert_eq!(dec.state().address_phase, before.address_phase);
        assert_eq!(dec.stats().stops, 1);
    }

    #[test]
    fn sda_change_during_clock_rise_is_silent() {
        let mut dec = decoder();
        start(&mut dec);
        dec.feed(0);
        // SCL rises and SDA rises in the same sample.
        assert_eq!(dec.feed(CLK | SDA), None);
        assert_eq!(dec.state().bits_remaining, 8);
        assert_eq!(dec.stats().glitches, 1);
    }

    #[test]
    fn clock_rise_before_any_start_is_empty_nack() {
        let mut dec = decoder();
        dec.feed(SDA);
        assert_eq!(
            dec.feed(CLK | SDA),
            Some(Event::Nack(Acknowledged::Data { value: 0 }))
        );
    }

    #[test]
    fn clock_rise_before_any_start_with_sda_low_is_empty_ack() {
        let mut dec = decoder();
        // Leaving idle with both lines dropping at once is neither START nor STOP.
        assert_eq!(dec.feed(0), None);
        assert_eq!(dec.feed(CLK), Some(Event::Ack(Acknowledged::Data { value: 0 })));
        assert_eq!(dec.state().bits_remaining, 8);
    }

    #[test]
    fn repeated_start_restarts_address_phase() {
        let mut dec = decoder();
        start(&mut dec);
        send_byte(&mut dec, 0x20);
        ack_slot(&mut dec, true);
        send_byte(&mut dec, 0x01);
        ack_slot(&mut dec, true);
        // Release SDA with SCL low, raise SCL, then pull SDA low.
        dec.feed(SDA);
        assert_eq!(dec.feed(CLK | SDA), Some(Event::Bit(1)));
        assert_eq!(dec.feed(CLK), Some(Event::Start));
        assert!(dec.state().address_phase);
        assert_eq!(dec.state().bits_remaining, 8);
    }

    #[test]
    fn events_serialize_with_tags() {
        let json = serde_json::to_string(&Event::Ack(Acknowledged::Address {
            address: 0x3C,
            direction: Direction::Write,
        }))
        .unwrap();
        assert_eq!(
            json,
            r#"{"kind":"ack","detail":{"phase":"address","address":60,"direction":"write"}}"#
        );
        assert_eq!(
            serde_json::to_string(&Event::Bit(1)).unwrap(),
            r#"{"kind":"bit","detail":1}"#
        );
        assert_eq!(serde_json::to_string(&Event::Stop).unwrap(), r#"{"kind":"stop"}"#);
    }
}
