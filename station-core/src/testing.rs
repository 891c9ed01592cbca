//! Scripted collaborators for unit tests.

use crate::bus::{BusTransport, Bytes};
use crate::error::{BusError, DisplayError, SensorError};
use crate::io::{DigitalInput, DisplaySurface, StatusIndicator};
use crate::sensors::{ClimateReading, ClimateSensor, LightReading, LightSensor};
use embedded_hal::delay::DelayNs;
use std::cell::RefCell;
use std::collections::{HashMap, VecDeque};
use std::rc::Rc;

/// Something a mock observed, in order.
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    Read { address: u8, register: u8, len: usize },
    Write { address: u8, register: u8, value: u8 },
    Command { address: u8, command: u8 },
    Receive { address: u8, len: usize },
    Delay { ms: u32 },
}

/// Shared, ordered event log.
#[derive(Debug, Clone, Default)]
pub struct Trace(Rc<RefCell<Vec<Event>>>);

impl Trace {
    pub fn push(&self, event: Event) {
        self.0.borrow_mut().push(event);
    }

    pub fn events(&self) -> Vec<Event> {
        self.0.borrow().clone()
    }

    pub fn clear(&self) {
        self.0.borrow_mut().clear();
    }

    pub fn writes_to(&self, address: u8) -> Vec<(u8, u8)> {
        self.0
            .borrow()
            .iter()
            .filter_map(|e| match *e {
                Event::Write {
                    address: a,
                    register,
                    value,
                } if a == address => Some((register, value)),
                _ => None,
            })
            .collect()
    }

    pub fn reads_from(&self, address: u8) -> Vec<u8> {
        self.0
            .borrow()
            .iter()
            .filter_map(|e| match *e {
                Event::Read {
                    address: a,
                    register,
                    ..
                } if a == address => Some(register),
                _ => None,
            })
            .collect()
    }

    pub fn total_delay_ms(&self) -> u32 {
        self.0
            .borrow()
            .iter()
            .map(|e| match *e {
                Event::Delay { ms } => ms,
                _ => 0,
            })
            .sum()
    }
}

#[derive(Default)]
struct BusState {
    registers: HashMap<(u8, u8), u8>,
    reply_len: HashMap<(u8, u8), usize>,
    received: HashMap<u8, Vec<u8>>,
    failing_reads: HashMap<u8, usize>,
    failing_writes: HashMap<u8, usize>,
}

impl BusState {
    fn take_failure(counts: &mut HashMap<u8, usize>, address: u8) -> bool {
        match counts.get_mut(&address) {
            Some(n) if *n > 0 => {
                *n -= 1;
                true
            }
            _ => false,
        }
    }
}

/// Register-map bus with per-address failure injection.
#[derive(Clone, Default)]
pub struct MockBus {
    state: Rc<RefCell<BusState>>,
    trace: Trace,
}

impl MockBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn trace(&self) -> Trace {
        self.trace.clone()
    }

    pub fn set_register(&mut self, address: u8, register: u8, value: u8) {
        self.state
            .borrow_mut()
            .registers
            .insert((address, register), value);
    }

    pub fn set_registers(&mut self, address: u8, first: u8, values: &[u8]) {
        for (offset, &value) in values.iter().enumerate() {
            self.set_register(address, first + offset as u8, value);
        }
    }

    pub fn register(&self, address: u8, register: u8) -> u8 {
        self.state
            .borrow()
            .registers
            .get(&(address, register))
            .copied()
            .unwrap_or(0)
    }

    /// Make reads of `register` return `len` bytes whatever was requested.
    pub fn set_reply_len(&mut self, address: u8, register: u8, len: usize) {
        self.state
            .borrow_mut()
            .reply_len
            .insert((address, register), len);
    }

    pub fn set_received(&mut self, address: u8, bytes: &[u8]) {
        self.state
            .borrow_mut()
            .received
            .insert(address, bytes.to_vec());
    }

    /// The next `count` reads from `address` fail with a NACK.
    pub fn fail_reads(&mut self, address: u8, count: usize) {
        self.state.borrow_mut().failing_reads.insert(address, count);
    }

    /// The next `count` writes to `address` fail with a NACK.
    pub fn fail_writes(&mut self, address: u8, count: usize) {
        self.state.borrow_mut().failing_writes.insert(address, count);
    }
}

impl BusTransport for MockBus {
    fn read(&mut self, address: u8, register: u8, len: usize) -> Result<Bytes, BusError> {
        self.trace.push(Event::Read {
            address,
            register,
            len,
        });

        let mut state = self.state.borrow_mut();
        if BusState::take_failure(&mut state.failing_reads, address) {
            return Err(BusError::Nack { address });
        }

        let len = state
            .reply_len
            .get(&(address, register))
            .copied()
            .unwrap_or(len);

        let mut bytes = Bytes::new();
        for offset in 0..len {
            let reg = register.wrapping_add(offset as u8);
            let value = state.registers.get(&(address, reg)).copied().unwrap_or(0);
            bytes
                .push(value)
                .map_err(|_| BusError::Transfer {
                    address,
                    details: "mock reply too long".into(),
                })?;
        }

        Ok(bytes)
    }

    fn write(&mut self, address: u8, register: u8, value: u8) -> Result<(), BusError> {
        self.trace.push(Event::Write {
            address,
            register,
            value,
        });

        let mut state = self.state.borrow_mut();
        if BusState::take_failure(&mut state.failing_writes, address) {
            return Err(BusError::Nack { address });
        }

        state.registers.insert((address, register), value);
        Ok(())
    }

    fn command(&mut self, address: u8, command: u8) -> Result<(), BusError> {
        self.trace.push(Event::Command { address, command });

        let mut state = self.state.borrow_mut();
        if BusState::take_failure(&mut state.failing_writes, address) {
            return Err(BusError::Nack { address });
        }

        Ok(())
    }

    fn receive(&mut self, address: u8, len: usize) -> Result<Bytes, BusError> {
        self.trace.push(Event::Receive { address, len });

        let mut state = self.state.borrow_mut();
        if BusState::take_failure(&mut state.failing_reads, address) {
            return Err(BusError::Nack { address });
        }

        let data = state.received.get(&address).cloned().unwrap_or_default();
        Bytes::from_slice(&data[..len.min(data.len())]).map_err(|_| BusError::Transfer {
            address,
            details: "mock reply too long".into(),
        })
    }
}

/// Delay that only records how long it was asked to wait.
#[derive(Clone, Default)]
pub struct MockDelay {
    trace: Trace,
}

impl MockDelay {
    pub fn new(trace: Trace) -> Self {
        Self { trace }
    }
}

impl DelayNs for MockDelay {
    fn delay_ns(&mut self, ns: u32) {
        self.trace.push(Event::Delay {
            ms: ns.div_ceil(1_000_000),
        });
    }

    fn delay_ms(&mut self, ms: u32) {
        self.trace.push(Event::Delay { ms });
    }
}

/// Climate sensor replaying a script, then repeating `fallback`.
pub struct ScriptedClimate {
    pub script: VecDeque<Result<ClimateReading, SensorError>>,
    pub fallback: ClimateReading,
}

impl ScriptedClimate {
    pub fn steady(reading: ClimateReading) -> Self {
        Self {
            script: VecDeque::new(),
            fallback: reading,
        }
    }
}

impl ClimateSensor for ScriptedClimate {
    fn read(&mut self, _bus: &mut dyn BusTransport) -> Result<ClimateReading, SensorError> {
        self.script.pop_front().unwrap_or(Ok(self.fallback))
    }
}

/// Light sensor replaying a script, then repeating `fallback`.
pub struct ScriptedLight {
    pub script: VecDeque<Result<LightReading, SensorError>>,
    pub fallback: LightReading,
}

impl ScriptedLight {
    pub fn steady(lux: f32) -> Self {
        Self {
            script: VecDeque::new(),
            fallback: LightReading { lux },
        }
    }
}

impl LightSensor for ScriptedLight {
    fn read(
        &mut self,
        _bus: &mut dyn BusTransport,
        _delay: &mut dyn DelayNs,
    ) -> Result<LightReading, SensorError> {
        self.script.pop_front().unwrap_or(Ok(self.fallback))
    }
}

/// Call made on the mock display.
#[derive(Debug, Clone, PartialEq)]
pub enum DisplayCall {
    Init,
    Clear,
    Text { text: String, x: u16, y: u16 },
    Flush,
    Contrast(u8),
    Sleep(bool),
}

#[derive(Default)]
struct DisplayState {
    calls: Vec<DisplayCall>,
    failing_inits: usize,
    failing_flushes: usize,
}

/// Display recording every call, with flush failure injection.
#[derive(Clone, Default)]
pub struct MockDisplay {
    state: Rc<RefCell<DisplayState>>,
}

impl MockDisplay {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> Vec<DisplayCall> {
        self.state.borrow().calls.clone()
    }

    pub fn clear_calls(&self) {
        self.state.borrow_mut().calls.clear();
    }

    /// Text drawn since the last call to `clear_calls`.
    pub fn texts(&self) -> Vec<String> {
        self.state
            .borrow()
            .calls
            .iter()
            .filter_map(|c| match c {
                DisplayCall::Text { text, .. } => Some(text.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn fail_inits(&self, count: usize) {
        self.state.borrow_mut().failing_inits = count;
    }

    pub fn fail_flushes(&self, count: usize) {
        self.state.borrow_mut().failing_flushes = count;
    }

    fn record(&self, call: DisplayCall) {
        self.state.borrow_mut().calls.push(call);
    }
}

impl DisplaySurface for MockDisplay {
    fn init(&mut self) -> Result<(), DisplayError> {
        self.record(DisplayCall::Init);

        let mut state = self.state.borrow_mut();
        if state.failing_inits > 0 {
            state.failing_inits -= 1;
            return Err(DisplayError::Bus(BusError::Nack { address: 0x3c }));
        }

        Ok(())
    }

    fn clear(&mut self) -> Result<(), DisplayError> {
        self.record(DisplayCall::Clear);
        Ok(())
    }

    fn draw_text(&mut self, text: &str, x: u16, y: u16) -> Result<(), DisplayError> {
        self.record(DisplayCall::Text {
            text: text.into(),
            x,
            y,
        });
        Ok(())
    }

    fn flush(&mut self) -> Result<(), DisplayError> {
        self.record(DisplayCall::Flush);

        let mut state = self.state.borrow_mut();
        if state.failing_flushes > 0 {
            state.failing_flushes -= 1;
            return Err(DisplayError::Bus(BusError::Nack { address: 0x3c }));
        }

        Ok(())
    }

    fn set_contrast(&mut self, level: u8) -> Result<(), DisplayError> {
        self.record(DisplayCall::Contrast(level));
        Ok(())
    }

    fn sleep(&mut self, enabled: bool) -> Result<(), DisplayError> {
        self.record(DisplayCall::Sleep(enabled));
        Ok(())
    }
}

/// Button replaying levels, then holding the last one.
#[derive(Clone, Default)]
pub struct ScriptedButton {
    levels: Rc<RefCell<VecDeque<bool>>>,
    last: Rc<RefCell<bool>>,
}

impl ScriptedButton {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, levels: &[bool]) {
        self.levels.borrow_mut().extend(levels.iter().copied());
    }
}

impl DigitalInput for ScriptedButton {
    fn read_level(&mut self) -> bool {
        if let Some(level) = self.levels.borrow_mut().pop_front() {
            *self.last.borrow_mut() = level;
        }
        *self.last.borrow()
    }
}

/// Indicator remembering every colour it was set to.
#[derive(Clone, Default)]
pub struct RecordingIndicator {
    colors: Rc<RefCell<Vec<(u8, u8, u8)>>>,
}

impl RecordingIndicator {
    pub fn colors(&self) -> Vec<(u8, u8, u8)> {
        self.colors.borrow().clone()
    }
}

impl StatusIndicator for RecordingIndicator {
    fn set_color(&mut self, r: u8, g: u8, b: u8) {
        self.colors.borrow_mut().push((r, g, b));
    }
}
