//! Raw register dumps for bring-up. Nothing here is needed for normal operation.

use embedded_hal::i2c::I2c;
use embedded_hal_async::i2c::I2c as AsyncI2c;

use crate::{
    descriptors::{self, Descriptor},
    Max1720x, Variant,
};

/// Unconverted Current and RepCap registers.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct RawDump {
    pub current: u16,
    pub capacity: u16,
}

impl RawDump {
    pub fn current_signed(&self) -> i16 {
        self.current as i16
    }
}

#[cfg(feature = "ufmt-impl")]
impl ufmt::uDisplay for RawDump {
    fn fmt<W>(&self, f: &mut ufmt::Formatter<'_, W>) -> Result<(), W::Error>
    where
        W: ufmt::uWrite + ?Sized,
    {
        ufmt::uwrite!(
            f,
            "Current: {} RepCap: {}",
            self.current_signed(),
            self.capacity
        )
    }
}

fn is_multi_cell_only(descriptor: &Descriptor) -> bool {
    [
        descriptors::VCELL1,
        descriptors::VCELL2,
        descriptors::VCELL3,
        descriptors::VCELL4,
        descriptors::BATT,
    ]
    .contains(&descriptor.register)
}

fn applies_to<V: Variant>(descriptor: &Descriptor) -> bool {
    V::MULTI_CELL || !is_multi_cell_only(descriptor)
}

impl<I, V> Max1720x<I, V>
where
    I: I2c,
    V: Variant,
{
    pub fn dump_raw(&mut self) -> Result<RawDump, I::Error> {
        let dump = RawDump {
            current: self.read_register(descriptors::CURRENT)?,
            capacity: self.read_capacity_raw()?,
        };
        debug!("{}: Current = {:x}, RepCap = {:x}", V::NAME, dump.current, dump.capacity);
        Ok(dump)
    }

    /// Reads every measurement register that exists on this variant, passing the raw and the
    /// converted value to `f`.
    pub fn for_each_measurement(
        &mut self,
        mut f: impl FnMut(&Descriptor, u16, f32),
    ) -> Result<(), I::Error> {
        for descriptor in descriptors::MEASUREMENTS {
            if !applies_to::<V>(descriptor) {
                continue;
            }
            let raw = self.read_register(descriptor.register)?;
            f(descriptor, raw, descriptor.convert(raw, self.config()));
        }
        Ok(())
    }

    pub fn log_measurements(&mut self) -> Result<(), I::Error> {
        self.for_each_measurement(|_descriptor, _raw, _value| {
            debug!(
                "{}: {:x} = {} {}",
                _descriptor.name,
                _raw,
                _value,
                _descriptor.unit
            );
        })
    }
}

impl<I, V> Max1720x<I, V>
where
    I: AsyncI2c,
    V: Variant,
{
    pub async fn dump_raw_async(&mut self) -> Result<RawDump, I::Error> {
        let dump = RawDump {
            current: self.read_register_async(descriptors::CURRENT).await?,
            capacity: self.read_capacity_raw_async().await?,
        };
        debug!("{}: Current = {:x}, RepCap = {:x}", V::NAME, dump.current, dump.capacity);
        Ok(dump)
    }

    pub async fn for_each_measurement_async(
        &mut self,
        mut f: impl FnMut(&Descriptor, u16, f32),
    ) -> Result<(), I::Error> {
        for descriptor in descriptors::MEASUREMENTS {
            if !applies_to::<V>(descriptor) {
                continue;
            }
            let raw = self.read_register_async(descriptor.register).await?;
            f(descriptor, raw, descriptor.convert(raw, self.config()));
        }
        Ok(())
    }
}
