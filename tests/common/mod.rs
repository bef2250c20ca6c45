//! In-memory RFM95 used to drive the radio without hardware

#![allow(dead_code)]

use std::cell::{Cell, RefCell, RefMut};
use std::collections::VecDeque;
use std::rc::Rc;
use std::time::Duration;

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{self, ErrorKind, ErrorType, OutputPin};
use rfm95::{Config, Configuration, Radio, Transport, REG_FIFO};

const REG_OP_MODE: usize = 0x01;
const REG_RSSI_VALUE: usize = 0x11;
const REG_FIFO_THRESH: usize = 0x35;
const REG_SEQ_CONFIG_1: usize = 0x36;
const REG_IRQ_FLAGS_1: u8 = 0x3E;
const REG_IRQ_FLAGS_2: u8 = 0x3F;
const REG_VERSION: usize = 0x42;

const MODE_MASK: u8 = 0b111;
const STANDBY: u8 = 1;
const TRANSMITTER: u8 = 3;
const SEQUENCER_START: u8 = 1 << 7;
const FIFO_FULL: u8 = 1 << 7;
const FIFO_EMPTY: u8 = 1 << 6;
const FIFO_LEVEL: u8 = 1 << 5;
const FIFO_OVERRUN: u8 = 1 << 4;
const MODE_READY: u8 = 1 << 7;
const THRESHOLD_MASK: u8 = 0x3F;

/// Depth of the simulated FIFO.
pub const FIFO_DEPTH: usize = 64;

/// Error returned by the simulated bus.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BusFault;

pub struct ChipState {
    pub regs: [u8; 128],
    /// Bytes waiting to be read from the FIFO
    pub rx: VecDeque<u8>,
    /// Every byte written to the FIFO
    pub tx: Vec<u8>,
    /// Length of every FIFO write burst
    pub bursts: Vec<usize>,
    /// Transmit bytes queued in the FIFO and not yet sent
    pub tx_level: usize,
    /// Value of `tx_level` just before each burst
    pub levels_before_burst: Vec<usize>,
    /// Highest `tx_level` ever reached
    pub max_tx_level: usize,
    /// Bytes sent over the air between two RegIrqFlags2 reads
    pub drain_per_poll: usize,
    pub reads: usize,
    pub writes: usize,
    pub interrupts: usize,
    /// Every access fails while set
    pub fail: bool,
    /// Only the access with this index fails
    pub fail_at: Option<usize>,
    pub mode_ready: bool,
    /// Mode polls the sequencer spends in Transmitter before returning to Standby
    pub tx_polls: usize,
    tx_remaining: usize,
}

impl ChipState {
    pub fn ops(&self) -> usize {
        self.reads + self.writes
    }

    pub fn mode_bits(&self) -> u8 {
        self.regs[REG_OP_MODE] & MODE_MASK
    }

    pub fn set_mode_bits(&mut self, mode: u8) {
        self.regs[REG_OP_MODE] = self.regs[REG_OP_MODE] & !MODE_MASK | mode;
    }

    fn access(&mut self, write: bool) -> Result<(), BusFault> {
        let index = self.ops();
        if write {
            self.writes += 1;
        } else {
            self.reads += 1;
        }
        if self.fail || self.fail_at == Some(index) {
            return Err(BusFault);
        }
        Ok(())
    }

    fn load(&mut self, addr: u8) -> u8 {
        match addr {
            REG_FIFO => self.rx.pop_front().unwrap_or(0),
            REG_IRQ_FLAGS_1 => {
                if self.mode_ready {
                    MODE_READY
                } else {
                    0
                }
            }
            REG_IRQ_FLAGS_2 => {
                // FifoEmpty tracks the receive side only.
                let mut flags = self.regs[usize::from(addr)] & FIFO_OVERRUN;
                if self.rx.is_empty() {
                    flags |= FIFO_EMPTY;
                }
                if self.tx_level >= FIFO_DEPTH {
                    flags |= FIFO_FULL;
                }
                if self.tx_level > usize::from(self.regs[REG_FIFO_THRESH] & THRESHOLD_MASK) {
                    flags |= FIFO_LEVEL;
                }
                self.tx_level = self.tx_level.saturating_sub(self.drain_per_poll);
                flags
            }
            0x01 if self.tx_remaining > 0 => {
                self.tx_remaining -= 1;
                if self.tx_remaining == 0 {
                    self.set_mode_bits(STANDBY);
                }
                self.regs[REG_OP_MODE]
            }
            _ => self.regs[usize::from(addr)],
        }
    }

    fn store(&mut self, addr: u8, value: u8) {
        match addr {
            REG_FIFO => self.tx.push(value),
            // Flags are cleared by writing 1; clearing FifoOverrun flushes the FIFO.
            REG_IRQ_FLAGS_2 => {
                self.regs[usize::from(addr)] &= !value;
                if value & FIFO_OVERRUN != 0 {
                    self.tx_level = 0;
                }
            }
            _ => self.regs[usize::from(addr)] = value,
        }
    }

    fn fifo_burst(&mut self, bytes: &[u8]) {
        self.tx.extend_from_slice(bytes);
        self.bursts.push(bytes.len());
        self.levels_before_burst.push(self.tx_level);
        self.tx_level += bytes.len();
        self.max_tx_level = self.max_tx_level.max(self.tx_level);
        if self.regs[REG_SEQ_CONFIG_1] & SEQUENCER_START != 0 && self.tx_polls > 0 {
            self.set_mode_bits(TRANSMITTER);
            self.tx_remaining = self.tx_polls;
        }
    }
}

/// Shared handle on a simulated chip; clones observe the same state.
#[derive(Clone)]
pub struct SimChip(Rc<RefCell<ChipState>>);

impl SimChip {
    /// A chip fresh out of reset, in Standby, reporting `version`.
    pub fn with_version(version: u8) -> Self {
        let mut regs = [0u8; 128];
        let image = Configuration::RESET.to_image();
        regs[1..=image.len()].copy_from_slice(&image);
        regs[REG_VERSION] = version;
        regs[REG_RSSI_VALUE] = 90;
        Self(Rc::new(RefCell::new(ChipState {
            regs,
            rx: VecDeque::new(),
            tx: Vec::new(),
            bursts: Vec::new(),
            tx_level: 0,
            levels_before_burst: Vec::new(),
            max_tx_level: 0,
            drain_per_poll: FIFO_DEPTH,
            reads: 0,
            writes: 0,
            interrupts: 0,
            fail: false,
            fail_at: None,
            mode_ready: true,
            tx_polls: 0,
            tx_remaining: 0,
        })))
    }

    pub fn new() -> Self {
        Self::with_version(0x12)
    }

    pub fn state(&self) -> RefMut<'_, ChipState> {
        self.0.borrow_mut()
    }

    /// Queues `bytes` for the FIFO.
    pub fn queue_rx(&self, bytes: &[u8]) {
        self.state().rx.extend(bytes.iter().copied());
    }
}

impl Transport for SimChip {
    type Error = BusFault;

    fn read_register(&mut self, addr: u8) -> Result<u8, Self::Error> {
        let mut state = self.state();
        state.access(false)?;
        Ok(state.load(addr))
    }

    fn write_register(&mut self, addr: u8, value: u8) -> Result<(), Self::Error> {
        let mut state = self.state();
        state.access(true)?;
        state.store(addr, value);
        Ok(())
    }

    fn read_burst(&mut self, addr: u8, buf: &mut [u8]) -> Result<(), Self::Error> {
        let mut state = self.state();
        state.access(false)?;
        for (offset, byte) in buf.iter_mut().enumerate() {
            let addr = if addr == REG_FIFO { addr } else { addr + offset as u8 };
            *byte = state.load(addr);
        }
        Ok(())
    }

    fn write_burst(&mut self, addr: u8, bytes: &[u8]) -> Result<(), Self::Error> {
        let mut state = self.state();
        state.access(true)?;
        if addr == REG_FIFO {
            state.fifo_burst(bytes);
        } else {
            for (offset, byte) in bytes.iter().enumerate() {
                state.store(addr + offset as u8, *byte);
            }
        }
        Ok(())
    }

    fn await_interrupt(&mut self, _timeout: Duration) -> Result<(), Self::Error> {
        let mut state = self.state();
        state.access(false)?;
        state.interrupts += 1;
        Ok(())
    }
}

/// Error raised by a failing [`ResetPin`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PinFault;

impl digital::Error for PinFault {
    fn kind(&self) -> ErrorKind {
        ErrorKind::Other
    }
}

/// Reset line recording every level it is driven to.
#[derive(Clone, Default)]
pub struct ResetPin {
    pub levels: Rc<RefCell<Vec<bool>>>,
    pub fail: Rc<Cell<bool>>,
}

impl ErrorType for ResetPin {
    type Error = PinFault;
}

impl OutputPin for ResetPin {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        if self.fail.get() {
            return Err(PinFault);
        }
        self.levels.borrow_mut().push(false);
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        if self.fail.get() {
            return Err(PinFault);
        }
        self.levels.borrow_mut().push(true);
        Ok(())
    }
}

/// Delay that only advances a counter.
#[derive(Clone, Default)]
pub struct Clock {
    pub elapsed_ns: Rc<Cell<u64>>,
}

impl Clock {
    pub fn elapsed(&self) -> Duration {
        Duration::from_nanos(self.elapsed_ns.get())
    }
}

impl DelayNs for Clock {
    fn delay_ns(&mut self, ns: u32) {
        self.elapsed_ns.set(self.elapsed_ns.get() + u64::from(ns));
    }
}

pub struct Harness {
    pub chip: SimChip,
    pub pin: ResetPin,
    pub clock: Clock,
    pub radio: Radio<SimChip, ResetPin, Clock>,
}

/// Opens a radio on a fresh chip.
pub fn open_with(chip: SimChip, config: Config) -> Harness {
    let pin = ResetPin::default();
    let clock = Clock::default();
    let radio = Radio::open(chip.clone(), pin.clone(), clock.clone(), config);
    Harness {
        chip,
        pin,
        clock,
        radio,
    }
}

pub fn open() -> Harness {
    open_with(SimChip::new(), Config::default())
}
