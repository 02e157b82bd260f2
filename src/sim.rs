//! In-memory model of the gauge's two register files, driven through the `I2c` traits.

use embedded_hal::i2c::{ErrorKind, ErrorType, I2c, NoAcknowledgeSource, Operation};

use crate::ll::{AddressSpace, RegisterAddress};

#[derive(Clone, Debug, PartialEq)]
pub enum BusEvent {
    Read(RegisterAddress),
    /// Payload bytes as they appeared on the bus.
    Write(RegisterAddress, Vec<u8>),
}

pub struct SimulatedGauge {
    low: [u16; 256],
    high: [u16; 256],
    failing: Vec<RegisterAddress>,
    read_only: Vec<RegisterAddress>,
    pub events: Vec<BusEvent>,
}

impl SimulatedGauge {
    pub fn new() -> Self {
        Self {
            low: [0; 256],
            high: [0; 256],
            failing: Vec::new(),
            read_only: Vec::new(),
            events: Vec::new(),
        }
    }

    fn slot(&mut self, reg: RegisterAddress) -> &mut u16 {
        match reg.space {
            AddressSpace::Low => &mut self.low[reg.offset as usize],
            AddressSpace::High => &mut self.high[reg.offset as usize],
        }
    }

    pub fn set(&mut self, reg: RegisterAddress, value: u16) {
        *self.slot(reg) = value;
    }

    pub fn set_bytes(&mut self, reg: RegisterAddress, bytes: [u8; 2]) {
        self.set(reg, u16::from_le_bytes(bytes));
    }

    pub fn get(&mut self, reg: RegisterAddress) -> u16 {
        *self.slot(reg)
    }

    /// Every access to `reg` is recorded, then fails.
    pub fn fail_on(&mut self, reg: RegisterAddress) {
        self.failing.push(reg);
    }

    /// Writes to `reg` are acknowledged but ignored.
    pub fn read_only(&mut self, reg: RegisterAddress) {
        self.read_only.push(reg);
    }

    fn execute(&mut self, address: u8, operations: &mut [Operation<'_>]) -> Result<(), ErrorKind> {
        let space = match address {
            0x36 => AddressSpace::Low,
            0x0B => AddressSpace::High,
            _ => return Err(ErrorKind::NoAcknowledge(NoAcknowledgeSource::Address)),
        };

        // Consecutive writes are a single write on the bus.
        let mut written = Vec::new();
        let mut read_buffer = None;
        for operation in operations.iter_mut() {
            match operation {
                Operation::Write(bytes) => {
                    assert!(read_buffer.is_none(), "write after read");
                    written.extend_from_slice(bytes);
                }
                Operation::Read(buffer) => read_buffer = Some(buffer),
            }
        }

        let (&offset, payload) = written
            .split_first()
            .expect("transaction without register address");
        let reg = RegisterAddress { space, offset };

        match read_buffer {
            Some(buffer) => {
                self.events.push(BusEvent::Read(reg));
                if self.failing.contains(&reg) {
                    return Err(ErrorKind::Other);
                }

                assert_eq!(buffer.len(), 2, "registers are 16 bits wide");
                buffer.copy_from_slice(&self.get(reg).to_le_bytes());
            }
            None => {
                self.events.push(BusEvent::Write(reg, payload.to_vec()));
                if self.failing.contains(&reg) {
                    return Err(ErrorKind::Other);
                }

                let value: [u8; 2] = payload.try_into().expect("registers are 16 bits wide");
                if !self.read_only.contains(&reg) {
                    self.set_bytes(reg, value);
                }
            }
        }

        Ok(())
    }
}

impl ErrorType for SimulatedGauge {
    type Error = ErrorKind;
}

impl I2c for SimulatedGauge {
    fn transaction(
        &mut self,
        address: u8,
        operations: &mut [Operation<'_>],
    ) -> Result<(), Self::Error> {
        self.execute(address, operations)
    }
}

impl embedded_hal_async::i2c::I2c for SimulatedGauge {
    async fn transaction(
        &mut self,
        address: u8,
        operations: &mut [Operation<'_>],
    ) -> Result<(), Self::Error> {
        self.execute(address, operations)
    }
}

/// Accumulates requested delays instead of sleeping.
#[derive(Default)]
pub struct RecordingDelay {
    total_ns: u64,
}

impl RecordingDelay {
    pub fn total_ms(&self) -> u64 {
        self.total_ns / 1_000_000
    }
}

impl embedded_hal::delay::DelayNs for RecordingDelay {
    fn delay_ns(&mut self, ns: u32) {
        self.total_ns += ns as u64;
    }
}

impl embedded_hal_async::delay::DelayNs for RecordingDelay {
    async fn delay_ns(&mut self, ns: u32) {
        self.total_ns += ns as u64;
    }
}
