#![cfg_attr(not(test), no_std)]

//! Driver for the Maxim MAX17201/MAX17205 stand-alone ModelGauge m5 fuel gauges.
//!
//! The MAX17201 monitors a single cell, the MAX17205 a multi-cell pack. Both share one register
//! map; the multi-cell accessors are only available on [`Max1720x<I, Max17205>`].
//!
//! Every accessor performs a fresh bus transaction. Nothing is cached and nothing is retried.

use core::{marker::PhantomData, num::NonZeroU32};

use bitflags::bitflags;
use embedded_hal::{delay::DelayNs, i2c::I2c};
use embedded_hal_async::{delay::DelayNs as AsyncDelayNs, i2c::I2c as AsyncI2c};

use crate::{descriptors::Descriptor, ll::RegisterAddress};

// This must go first so the logging macros are visible in the other modules.
#[macro_use]
mod fmt;

pub mod descriptors;
pub mod diag;
pub mod ll;

#[cfg(test)]
mod sim;

/// Length of the ROM ID in bytes.
pub const ID_LEN: usize = 8;

const RESET_DELAY_MS: u32 = 50;
const FILTER_CFG_WRITE_DELAY_MS: u32 = 100;

#[derive(Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigError<E> {
    Transfer(E),
    Verify,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DesignData {
    /// LSB = 1mOhm
    r_sense: NonZeroU32,
}

#[cfg(feature = "defmt")]
impl defmt::Format for DesignData {
    fn format(&self, f: defmt::Formatter) {
        defmt::write!(f, "DesignData {{ r_sense: {} mOhm }}", self.r_sense.get())
    }
}

impl Default for DesignData {
    fn default() -> Self {
        Self::from_milliohms(10)
    }
}

impl DesignData {
    pub const fn new(r_sense: NonZeroU32) -> Self {
        Self { r_sense }
    }

    /// Panics if `milliohms` is 0. In a `const` context this is a compile error.
    pub const fn from_milliohms(milliohms: u32) -> Self {
        match NonZeroU32::new(milliohms) {
            Some(r_sense) => Self { r_sense },
            None => panic!("sense resistor must not be 0 Ohm"),
        }
    }

    pub const fn r_sense_milliohms(&self) -> u32 {
        self.r_sense.get()
    }

    pub fn r_sense_ohms(&self) -> f32 {
        self.r_sense.get() as f32 / 1000.0
    }

    /// Converts a voltage measured across the sense resistor (μV) to current (mA). The same holds
    /// for μVh to mAh.
    #[inline]
    pub fn sense_uv_to_ma(&self, uv: f32) -> f32 {
        uv / self.r_sense.get() as f32
    }

    /// Converts the raw Current/AvgCurrent register value to a current value in mA.
    ///
    /// ```rust
    /// # use max1720x::DesignData;
    /// let design_data = DesignData::from_milliohms(10);
    ///
    /// assert_eq!(design_data.raw_current_to_mA(0), 0.0);
    /// assert_eq!(design_data.raw_current_to_mA(1), 0.15625);
    /// assert_eq!(design_data.raw_current_to_mA(0xFFFF), -0.15625);
    ///
    /// let design_data = DesignData::from_milliohms(20);
    ///
    /// assert_eq!(design_data.raw_current_to_mA(1), 0.078125);
    /// assert_eq!(design_data.raw_current_to_mA(0xFFFF), -0.078125);
    /// ```
    #[allow(non_snake_case)]
    #[inline]
    pub fn raw_current_to_mA(&self, raw: u16) -> f32 {
        descriptors::CURRENT_MA.convert(raw, self)
    }

    /// Converts the raw RepCap/FullCapRep register value to a capacity value in mAh.
    ///
    /// ```rust
    /// # use max1720x::DesignData;
    /// let design_data = DesignData::from_milliohms(10);
    ///
    /// assert_eq!(design_data.raw_capacity_to_mAh(0), 0.0);
    /// assert_eq!(design_data.raw_capacity_to_mAh(1), 0.5);
    /// assert_eq!(design_data.raw_capacity_to_mAh(65535), 32767.5);
    /// ```
    #[allow(non_snake_case)]
    #[inline]
    pub fn raw_capacity_to_mAh(&self, raw: u16) -> f32 {
        descriptors::CAPACITY_MAH.convert(raw, self)
    }

    /// Converts one half of the MaxMinCurr register to a current value in mA.
    ///
    /// ```rust
    /// # use max1720x::DesignData;
    /// let design_data = DesignData::from_milliohms(10);
    ///
    /// assert_eq!(design_data.raw_max_min_current_to_mA(1), 40.0);
    /// assert_eq!(design_data.raw_max_min_current_to_mA(-128), -5120.0);
    /// ```
    #[allow(non_snake_case)]
    #[inline]
    pub fn raw_max_min_current_to_mA(&self, raw: i8) -> f32 {
        self.sense_uv_to_ma(raw as f32 * descriptors::MAX_MIN_CURRENT_LSB_UV)
    }

    /// Converts the raw VCell/VCellX register value to a voltage value in mV.
    ///
    /// ```rust
    /// # use max1720x::DesignData;
    /// let design_data = DesignData::default();
    ///
    /// assert_eq!(design_data.raw_voltage_to_mV(0), 0.0);
    /// assert_eq!(design_data.raw_voltage_to_mV(1), 0.078125);
    /// assert_eq!(design_data.raw_voltage_to_mV(0x2000), 640.0);
    /// ```
    #[allow(non_snake_case)]
    #[inline]
    pub fn raw_voltage_to_mV(&self, raw: u16) -> f32 {
        descriptors::VOLTAGE_MV.convert(raw, self)
    }
}

/// Selects one of the per-cell voltage registers of a multi-cell pack.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Cell {
    #[default]
    One,
    Two,
    Three,
    Four,
}

impl Cell {
    /// Maps a 1-based cell index. Unknown indices select [`Cell::One`].
    pub const fn from_index(index: u8) -> Self {
        match index {
            2 => Cell::Two,
            3 => Cell::Three,
            4 => Cell::Four,
            _ => Cell::One,
        }
    }

    pub const fn descriptor(self) -> Descriptor {
        match self {
            Cell::One => descriptors::CELL1_VOLTAGE_MV,
            Cell::Two => descriptors::CELL2_VOLTAGE_MV,
            Cell::Three => descriptors::CELL3_VOLTAGE_MV,
            Cell::Four => descriptors::CELL4_VOLTAGE_MV,
        }
    }
}

impl From<u8> for Cell {
    fn from(index: u8) -> Self {
        Self::from_index(index)
    }
}

/// Selects one of the temperature registers in the high address space.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TemperatureProbe {
    /// Die temperature.
    #[default]
    Internal,
    Thermistor1,
    Thermistor2,
}

impl TemperatureProbe {
    /// Maps a 0-based probe index. Unknown indices select [`TemperatureProbe::Internal`].
    pub const fn from_index(index: u8) -> Self {
        match index {
            1 => TemperatureProbe::Thermistor1,
            2 => TemperatureProbe::Thermistor2,
            _ => TemperatureProbe::Internal,
        }
    }

    pub const fn descriptor(self) -> Descriptor {
        match self {
            TemperatureProbe::Internal => descriptors::TEMP_INT_C,
            TemperatureProbe::Thermistor1 => descriptors::TEMP1_C,
            TemperatureProbe::Thermistor2 => descriptors::TEMP2_C,
        }
    }
}

impl From<u8> for TemperatureProbe {
    fn from(index: u8) -> Self {
        Self::from_index(index)
    }
}

/// The AvgCurrent time constant, stored in the low nibble of FilterCfg.
///
/// AvgCurrent time constant = 45s x 2^(CURR-7), ranging from 0.35s (code 0) to 3.2h (code 15).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct AveragingWindow(u8);

impl AveragingWindow {
    pub const SHORTEST: Self = Self(0);
    pub const LONGEST: Self = Self(0x0F);

    /// Only the low 4 bits of `code` are used.
    pub const fn from_code(code: u8) -> Self {
        Self(code & 0x0F)
    }

    pub const fn code(self) -> u8 {
        self.0
    }

    pub fn as_secs_f32(self) -> f32 {
        45.0 * (1u32 << self.0) as f32 / 128.0
    }

    pub fn all() -> impl Iterator<Item = Self> {
        (Self::SHORTEST.0..=Self::LONGEST.0).map(Self::from_code)
    }

    fn apply_to(self, filter_cfg: u16) -> u16 {
        (filter_cfg & 0xFFF0) | self.0 as u16
    }
}

impl From<u8> for AveragingWindow {
    fn from(code: u8) -> Self {
        Self::from_code(code)
    }
}

bitflags! {
    /// The Status register maintains all flags related to alert thresholds and battery insertion
    /// or removal.
    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    pub struct Status: u16 {
        /// Power-on reset
        const POR = 1 << 1;
        /// Minimum current alert threshold exceeded
        const IMN = 1 << 2;
        /// Battery status, set when the battery is absent
        const BST = 1 << 3;
        /// Maximum current alert threshold exceeded
        const IMX = 1 << 6;
        /// State of charge 1% change alert
        const DSOCI = 1 << 7;
        /// Minimum voltage alert threshold exceeded
        const VMN = 1 << 8;
        /// Minimum temperature alert threshold exceeded
        const TMN = 1 << 9;
        /// Minimum SOC alert threshold exceeded
        const SMN = 1 << 10;
        /// Battery insertion
        const BI = 1 << 11;
        /// Maximum voltage alert threshold exceeded
        const VMX = 1 << 12;
        /// Maximum temperature alert threshold exceeded
        const TMX = 1 << 13;
        /// Maximum SOC alert threshold exceeded
        const SMX = 1 << 14;
        /// Battery removal
        const BR = 1 << 15;
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for Status {
    fn format(&self, f: defmt::Formatter) {
        defmt::write!(f, "Status({=u16:#x})", self.bits())
    }
}

/// Extracts the Bst bit (bit 3) of the Status register.
pub const fn battery_status_bit(raw: u16) -> u8 {
    Status::from_bits_truncate(raw).contains(Status::BST) as u8
}

/// Splits MaxMinCurr into `(minimum, maximum)`.
fn split_max_min(raw: u16) -> (i8, i8) {
    let [min, max] = raw.to_le_bytes();
    (min as i8, max as i8)
}

fn rom_id_word(index: u8) -> RegisterAddress {
    RegisterAddress {
        offset: descriptors::N_ROM_ID.offset + index,
        ..descriptors::N_ROM_ID
    }
}

pub trait Variant {
    const NAME: &'static str;
    /// Whether the per-cell and pack voltage registers are populated.
    const MULTI_CELL: bool;
}

/// Single-cell gauge.
pub enum Max17201 {}

/// Multi-cell gauge.
pub enum Max17205 {}

impl Variant for Max17201 {
    const NAME: &'static str = "MAX17201";
    const MULTI_CELL: bool = false;
}

impl Variant for Max17205 {
    const NAME: &'static str = "MAX17205";
    const MULTI_CELL: bool = true;
}

pub struct Max1720x<I, V> {
    driver: ll::Max1720xI2cInterface<I>,
    config: DesignData,
    _variant: PhantomData<V>,
}

impl<I, V> Max1720x<I, V> {
    pub const fn new(i2c: I, config: DesignData) -> Self {
        Self {
            driver: ll::Max1720xI2cInterface { i2c },
            config,
            _variant: PhantomData,
        }
    }

    pub fn config(&self) -> &DesignData {
        &self.config
    }

    pub fn inner_mut(&mut self) -> &mut I {
        &mut self.driver.i2c
    }

    pub fn release(self) -> I {
        self.driver.i2c
    }
}

impl<I> Max1720x<I, Max17201> {
    pub const fn max17201(i2c: I, config: DesignData) -> Self {
        Self::new(i2c, config)
    }
}

impl<I> Max1720x<I, Max17205> {
    pub const fn max17205(i2c: I, config: DesignData) -> Self {
        Self::new(i2c, config)
    }
}

impl<I, V> Max1720x<I, V>
where
    I: I2c,
    V: Variant,
{
    /// Reads a raw register value.
    pub fn read_register(&mut self, reg: RegisterAddress) -> Result<u16, I::Error> {
        self.driver.read_register(reg)
    }

    /// Writes a raw register value.
    pub fn write_register(&mut self, reg: RegisterAddress, value: u16) -> Result<(), I::Error> {
        self.driver.write_register(reg, value)
    }

    /// Reads the register described by `descriptor` and converts it to its physical unit.
    pub fn read_measurement(&mut self, descriptor: &Descriptor) -> Result<f32, I::Error> {
        let raw = self.driver.read_register(descriptor.register)?;
        Ok(descriptor.convert(raw, &self.config))
    }

    /// Returns the lowest cell voltage of the pack, or the cell voltage of a single cell, in mV.
    pub fn read_voltage(&mut self) -> Result<f32, I::Error> {
        self.read_measurement(&descriptors::VOLTAGE_MV)
    }

    /// Returns the battery current in mA. Positive values mean charging.
    pub fn read_current(&mut self) -> Result<f32, I::Error> {
        self.read_measurement(&descriptors::CURRENT_MA)
    }

    /// Returns the average battery current in mA.
    pub fn read_avg_current(&mut self) -> Result<f32, I::Error> {
        self.read_measurement(&descriptors::AVG_CURRENT_MA)
    }

    /// Returns the maximum current since the last MaxMinCurr reset, in mA.
    ///
    /// Each LSB is 400 μV across the sense resistor, i.e. 40 mA with the default 10 mΩ. Other
    /// resistor values scale the result instead of assuming 10 mΩ.
    pub fn read_max_current(&mut self) -> Result<f32, I::Error> {
        let raw = self.driver.read_register(descriptors::MAX_MIN_CURR)?;
        let (_, max) = split_max_min(raw);
        Ok(self.config.raw_max_min_current_to_mA(max))
    }

    /// Returns the minimum current since the last MaxMinCurr reset, in mA. Scaled like
    /// [`Self::read_max_current`].
    pub fn read_min_current(&mut self) -> Result<f32, I::Error> {
        let raw = self.driver.read_register(descriptors::MAX_MIN_CURR)?;
        let (min, _) = split_max_min(raw);
        Ok(self.config.raw_max_min_current_to_mA(min))
    }

    /// Returns the temperature in °C.
    pub fn read_temperature(&mut self) -> Result<f32, I::Error> {
        self.read_measurement(&descriptors::TEMPERATURE_C)
    }

    /// Returns the temperature measured by `probe` in °C.
    pub fn read_cell_temperature(
        &mut self,
        probe: impl Into<TemperatureProbe>,
    ) -> Result<f32, I::Error> {
        self.read_measurement(&probe.into().descriptor())
    }

    /// Returns the reported state of charge in %.
    pub fn read_soc(&mut self) -> Result<f32, I::Error> {
        self.read_measurement(&descriptors::SOC_PERCENT)
    }

    /// Returns the reported remaining capacity in mAh.
    pub fn read_capacity(&mut self) -> Result<f32, I::Error> {
        self.read_measurement(&descriptors::CAPACITY_MAH)
    }

    /// Returns the raw RepCap register value.
    pub fn read_capacity_raw(&mut self) -> Result<u16, I::Error> {
        self.driver.read_register(descriptors::REP_CAP)
    }

    /// Returns the reported full capacity in mAh.
    pub fn read_full_capacity(&mut self) -> Result<f32, I::Error> {
        self.read_measurement(&descriptors::FULL_CAPACITY_MAH)
    }

    /// Returns the estimated time to empty in seconds.
    pub fn read_tte(&mut self) -> Result<f32, I::Error> {
        self.read_measurement(&descriptors::TTE_S)
    }

    /// Returns the estimated time to full in seconds.
    pub fn read_ttf(&mut self) -> Result<f32, I::Error> {
        self.read_measurement(&descriptors::TTF_S)
    }

    /// Returns the Bst bit of the Status register: 1 if the battery is absent.
    pub fn read_battery_status(&mut self) -> Result<u8, I::Error> {
        let raw = self.driver.read_register(descriptors::STATUS)?;
        Ok(battery_status_bit(raw))
    }

    /// Returns the decoded Status register flags.
    pub fn read_status(&mut self) -> Result<Status, I::Error> {
        let raw = self.driver.read_register(descriptors::STATUS)?;
        Ok(Status::from_bits_truncate(raw))
    }

    /// Reads the 64-bit ROM ID. The four words are read in address order and each one is stored
    /// most significant byte first.
    pub fn read_id(&mut self) -> Result<[u8; ID_LEN], I::Error> {
        let mut id = [0; ID_LEN];
        for (index, word) in (0..).zip(id.chunks_exact_mut(2)) {
            let raw = self.driver.read_register(rom_id_word(index))?;
            word.copy_from_slice(&raw.to_be_bytes());
        }
        Ok(id)
    }

    /// Issues a hardware reset followed by a fuel gauge reset.
    ///
    /// A failure of the hardware reset command is logged and the sequence continues. The returned
    /// result is that of the fuel gauge reset write.
    pub fn reset(&mut self, delay: &mut impl DelayNs) -> Result<(), I::Error> {
        debug!("{}: reset", V::NAME);

        if self
            .driver
            .write_register(descriptors::COMMAND, descriptors::RESET_COMMAND)
            .is_err()
        {
            warn!("{}: hardware reset command failed", V::NAME);
        }

        delay.delay_ms(RESET_DELAY_MS);

        self.driver
            .write_register(descriptors::CONFIG2, descriptors::CONFIG2_POR_CMD)
    }

    /// Clears the recorded maximum and minimum currents.
    pub fn reset_max_min_avg_current(&mut self) -> Result<(), I::Error> {
        debug!("{}: resetting MaxMinCurr", V::NAME);
        self.driver
            .write_register(descriptors::MAX_MIN_CURR, descriptors::MAX_MIN_CURR_RESET)
    }

    /// Sets the AvgCurrent time constant, leaving the other FilterCfg fields untouched.
    pub fn set_current_avg_time(
        &mut self,
        window: impl Into<AveragingWindow>,
        delay: &mut impl DelayNs,
    ) -> Result<(), I::Error> {
        let window = window.into();
        debug!("{}: AvgCurrent window code {}", V::NAME, window.code());

        let filter_cfg = self.driver.read_register(descriptors::FILTER_CFG)?;
        delay.delay_ms(FILTER_CFG_WRITE_DELAY_MS);
        self.driver
            .write_register(descriptors::FILTER_CFG, window.apply_to(filter_cfg))
    }

    /// Same as [`Self::set_current_avg_time`], then reads FilterCfg back to check the new window.
    pub fn set_current_avg_time_verified(
        &mut self,
        window: impl Into<AveragingWindow>,
        delay: &mut impl DelayNs,
    ) -> Result<(), ConfigError<I::Error>> {
        let window = window.into();
        self.set_current_avg_time(window, delay)
            .map_err(ConfigError::Transfer)?;

        let readback = self
            .driver
            .read_register(descriptors::FILTER_CFG)
            .map_err(ConfigError::Transfer)?;

        if AveragingWindow::from_code(readback as u8) != window {
            warn!("{}: FilterCfg readback mismatch {:x}", V::NAME, readback);
            return Err(ConfigError::Verify);
        }

        Ok(())
    }

    /// Enables hibernate mode through nHibCfg.
    pub fn hibernate(&mut self) -> Result<(), I::Error> {
        debug!("{}: hibernate", V::NAME);
        self.driver
            .write_register(descriptors::N_HIB_CFG, descriptors::HIBERNATE_CONFIG)
    }
}

impl<I> Max1720x<I, Max17205>
where
    I: I2c,
{
    /// Returns the voltage of `cell` in mV. Unknown cell indices read cell 1.
    pub fn read_cell_voltage(&mut self, cell: impl Into<Cell>) -> Result<f32, I::Error> {
        self.read_measurement(&cell.into().descriptor())
    }

    /// Returns the pack voltage in V.
    pub fn read_pack_voltage(&mut self) -> Result<f32, I::Error> {
        self.read_measurement(&descriptors::PACK_VOLTAGE_V)
    }

    /// Writes `value` to nPackCfg.
    pub fn set_pack_cfg(&mut self, value: u16) -> Result<(), I::Error> {
        debug!("{}: nPackCfg = {:x}", Max17205::NAME, value);
        self.driver.write_register(descriptors::N_PACK_CFG, value)
    }
}

impl<I, V> Max1720x<I, V>
where
    I: AsyncI2c,
    V: Variant,
{
    /// Reads a raw register value.
    pub async fn read_register_async(&mut self, reg: RegisterAddress) -> Result<u16, I::Error> {
        self.driver.read_register_async(reg).await
    }

    /// Writes a raw register value.
    pub async fn write_register_async(
        &mut self,
        reg: RegisterAddress,
        value: u16,
    ) -> Result<(), I::Error> {
        self.driver.write_register_async(reg, value).await
    }

    /// Reads the register described by `descriptor` and converts it to its physical unit.
    pub async fn read_measurement_async(
        &mut self,
        descriptor: &Descriptor,
    ) -> Result<f32, I::Error> {
        let raw = self.driver.read_register_async(descriptor.register).await?;
        Ok(descriptor.convert(raw, &self.config))
    }

    /// Returns the lowest cell voltage of the pack, or the cell voltage of a single cell, in mV.
    pub async fn read_voltage_async(&mut self) -> Result<f32, I::Error> {
        self.read_measurement_async(&descriptors::VOLTAGE_MV).await
    }

    /// Returns the battery current in mA.
    pub async fn read_current_async(&mut self) -> Result<f32, I::Error> {
        self.read_measurement_async(&descriptors::CURRENT_MA).await
    }

    /// Returns the average battery current in mA.
    pub async fn read_avg_current_async(&mut self) -> Result<f32, I::Error> {
        self.read_measurement_async(&descriptors::AVG_CURRENT_MA)
            .await
    }

    /// Returns the maximum current since the last MaxMinCurr reset, in mA.
    pub async fn read_max_current_async(&mut self) -> Result<f32, I::Error> {
        let raw = self
            .driver
            .read_register_async(descriptors::MAX_MIN_CURR)
            .await?;
        let (_, max) = split_max_min(raw);
        Ok(self.config.raw_max_min_current_to_mA(max))
    }

    /// Returns the minimum current since the last MaxMinCurr reset, in mA.
    pub async fn read_min_current_async(&mut self) -> Result<f32, I::Error> {
        let raw = self
            .driver
            .read_register_async(descriptors::MAX_MIN_CURR)
            .await?;
        let (min, _) = split_max_min(raw);
        Ok(self.config.raw_max_min_current_to_mA(min))
    }

    /// Returns the temperature in °C.
    pub async fn read_temperature_async(&mut self) -> Result<f32, I::Error> {
        self.read_measurement_async(&descriptors::TEMPERATURE_C)
            .await
    }

    /// Returns the temperature measured by `probe` in °C.
    pub async fn read_cell_temperature_async(
        &mut self,
        probe: impl Into<TemperatureProbe>,
    ) -> Result<f32, I::Error> {
        self.read_measurement_async(&probe.into().descriptor())
            .await
    }

    /// Returns the reported state of charge in %.
    pub async fn read_soc_async(&mut self) -> Result<f32, I::Error> {
        self.read_measurement_async(&descriptors::SOC_PERCENT).await
    }

    /// Returns the reported remaining capacity in mAh.
    pub async fn read_capacity_async(&mut self) -> Result<f32, I::Error> {
        self.read_measurement_async(&descriptors::CAPACITY_MAH).await
    }

    /// Returns the raw RepCap register value.
    pub async fn read_capacity_raw_async(&mut self) -> Result<u16, I::Error> {
        self.driver.read_register_async(descriptors::REP_CAP).await
    }

    /// Returns the reported full capacity in mAh.
    pub async fn read_full_capacity_async(&mut self) -> Result<f32, I::Error> {
        self.read_measurement_async(&descriptors::FULL_CAPACITY_MAH)
            .await
    }

    /// Returns the estimated time to empty in seconds.
    pub async fn read_tte_async(&mut self) -> Result<f32, I::Error> {
        self.read_measurement_async(&descriptors::TTE_S).await
    }

    /// Returns the estimated time to full in seconds.
    pub async fn read_ttf_async(&mut self) -> Result<f32, I::Error> {
        self.read_measurement_async(&descriptors::TTF_S).await
    }

    /// Returns the Bst bit of the Status register: 1 if the battery is absent.
    pub async fn read_battery_status_async(&mut self) -> Result<u8, I::Error> {
        let raw = self.driver.read_register_async(descriptors::STATUS).await?;
        Ok(battery_status_bit(raw))
    }

    /// Returns the decoded Status register flags.
    pub async fn read_status_async(&mut self) -> Result<Status, I::Error> {
        let raw = self.driver.read_register_async(descriptors::STATUS).await?;
        Ok(Status::from_bits_truncate(raw))
    }

    /// Reads the 64-bit ROM ID. See [`Self::read_id`].
    pub async fn read_id_async(&mut self) -> Result<[u8; ID_LEN], I::Error> {
        let mut id = [0; ID_LEN];
        for (index, word) in (0..).zip(id.chunks_exact_mut(2)) {
            let raw = self.driver.read_register_async(rom_id_word(index)).await?;
            word.copy_from_slice(&raw.to_be_bytes());
        }
        Ok(id)
    }

    /// See [`Self::reset`].
    pub async fn reset_async(&mut self, delay: &mut impl AsyncDelayNs) -> Result<(), I::Error> {
        debug!("{}: reset", V::NAME);

        if self
            .driver
            .write_register_async(descriptors::COMMAND, descriptors::RESET_COMMAND)
            .await
            .is_err()
        {
            warn!("{}: hardware reset command failed", V::NAME);
        }

        delay.delay_ms(RESET_DELAY_MS).await;

        self.driver
            .write_register_async(descriptors::CONFIG2, descriptors::CONFIG2_POR_CMD)
            .await
    }

    /// Clears the recorded maximum and minimum currents.
    pub async fn reset_max_min_avg_current_async(&mut self) -> Result<(), I::Error> {
        debug!("{}: resetting MaxMinCurr", V::NAME);
        self.driver
            .write_register_async(descriptors::MAX_MIN_CURR, descriptors::MAX_MIN_CURR_RESET)
            .await
    }

    /// See [`Self::set_current_avg_time`].
    pub async fn set_current_avg_time_async(
        &mut self,
        window: impl Into<AveragingWindow>,
        delay: &mut impl AsyncDelayNs,
    ) -> Result<(), I::Error> {
        let window = window.into();
        debug!("{}: AvgCurrent window code {}", V::NAME, window.code());

        let filter_cfg = self
            .driver
            .read_register_async(descriptors::FILTER_CFG)
            .await?;
        delay.delay_ms(FILTER_CFG_WRITE_DELAY_MS).await;
        self.driver
            .write_register_async(descriptors::FILTER_CFG, window.apply_to(filter_cfg))
            .await
    }

    /// See [`Self::set_current_avg_time_verified`].
    pub async fn set_current_avg_time_verified_async(
        &mut self,
        window: impl Into<AveragingWindow>,
        delay: &mut impl AsyncDelayNs,
    ) -> Result<(), ConfigError<I::Error>> {
        let window = window.into();
        self.set_current_avg_time_async(window, delay)
            .await
            .map_err(ConfigError::Transfer)?;

        let readback = self
            .driver
            .read_register_async(descriptors::FILTER_CFG)
            .await
            .map_err(ConfigError::Transfer)?;

        if AveragingWindow::from_code(readback as u8) != window {
            warn!("{}: FilterCfg readback mismatch {:x}", V::NAME, readback);
            return Err(ConfigError::Verify);
        }

        Ok(())
    }

    /// Enables hibernate mode through nHibCfg.
    pub async fn hibernate_async(&mut self) -> Result<(), I::Error> {
        debug!("{}: hibernate", V::NAME);
        self.driver
            .write_register_async(descriptors::N_HIB_CFG, descriptors::HIBERNATE_CONFIG)
            .await
    }
}

impl<I> Max1720x<I, Max17205>
where
    I: AsyncI2c,
{
    /// Returns the voltage of `cell` in mV. Unknown cell indices read cell 1.
    pub async fn read_cell_voltage_async(
        &mut self,
        cell: impl Into<Cell>,
    ) -> Result<f32, I::Error> {
        self.read_measurement_async(&cell.into().descriptor())
            .await
    }

    /// Returns the pack voltage in V.
    pub async fn read_pack_voltage_async(&mut self) -> Result<f32, I::Error> {
        self.read_measurement_async(&descriptors::PACK_VOLTAGE_V)
            .await
    }

    /// Writes `value` to nPackCfg.
    pub async fn set_pack_cfg_async(&mut self, value: u16) -> Result<(), I::Error> {
        debug!("{}: nPackCfg = {:x}", Max17205::NAME, value);
        self.driver
            .write_register_async(descriptors::N_PACK_CFG, value)
            .await
    }
}
