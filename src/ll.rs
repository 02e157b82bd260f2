use embedded_hal::i2c::{I2c, Operation};
use embedded_hal_async::i2c::I2c as AsyncI2c;

/// The device answers on two I2C addresses. Registers `0x000..0x0FF` are reached through
/// [`AddressSpace::Low`], the nonvolatile shadow registers `0x100..0x1FF` through
/// [`AddressSpace::High`], using only the lower 8 bits of the register address.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum AddressSpace {
    Low,
    High,
}

impl AddressSpace {
    pub const fn device_addr(self) -> u8 {
        match self {
            AddressSpace::Low => 0x36,
            AddressSpace::High => 0x0B,
        }
    }
}

/// A register location: the address space and the 8-bit offset inside it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct RegisterAddress {
    pub space: AddressSpace,
    pub offset: u8,
}

impl RegisterAddress {
    pub const fn low(offset: u8) -> Self {
        Self {
            space: AddressSpace::Low,
            offset,
        }
    }

    pub const fn high(offset: u8) -> Self {
        Self {
            space: AddressSpace::High,
            offset,
        }
    }
}

pub struct Max1720xI2cInterface<I> {
    pub i2c: I,
}

impl<I> Max1720xI2cInterface<I>
where
    I: I2c,
{
    pub fn read_register(&mut self, reg: RegisterAddress) -> Result<u16, I::Error> {
        let mut data = [0; 2];
        self.i2c.transaction(
            reg.space.device_addr(),
            &mut [Operation::Write(&[reg.offset]), Operation::Read(&mut data)],
        )?;

        let raw = u16::from_le_bytes(data);
        trace!("read {:x}:{:x} = {:x}", reg.space.device_addr(), reg.offset, raw);
        Ok(raw)
    }

    pub fn write_register(&mut self, reg: RegisterAddress, value: u16) -> Result<(), I::Error> {
        trace!("write {:x}:{:x} = {:x}", reg.space.device_addr(), reg.offset, value);
        self.i2c.transaction(
            reg.space.device_addr(),
            &mut [
                Operation::Write(&[reg.offset]),
                Operation::Write(&value.to_le_bytes()),
            ],
        )
    }
}

impl<I> Max1720xI2cInterface<I>
where
    I: AsyncI2c,
{
    pub async fn read_register_async(&mut self, reg: RegisterAddress) -> Result<u16, I::Error> {
        let mut data = [0; 2];
        self.i2c
            .transaction(
                reg.space.device_addr(),
                &mut [Operation::Write(&[reg.offset]), Operation::Read(&mut data)],
            )
            .await?;

        let raw = u16::from_le_bytes(data);
        trace!("read {:x}:{:x} = {:x}", reg.space.device_addr(), reg.offset, raw);
        Ok(raw)
    }

    pub async fn write_register_async(
        &mut self,
        reg: RegisterAddress,
        value: u16,
    ) -> Result<(), I::Error> {
        trace!("write {:x}:{:x} = {:x}", reg.space.device_addr(), reg.offset, value);
        self.i2c
            .transaction(
                reg.space.device_addr(),
                &mut [
                    Operation::Write(&[reg.offset]),
                    Operation::Write(&value.to_le_bytes()),
                ],
            )
            .await
    }
}
