//! Register map of the MAX1720x and the conversion applied to each measurement register.

use crate::{ll::RegisterAddress, DesignData};

/// Status flags, alert and chip state.
pub const STATUS: RegisterAddress = RegisterAddress::low(0x00);
/// Reported remaining capacity.
pub const REP_CAP: RegisterAddress = RegisterAddress::low(0x05);
/// Reported state of charge.
pub const REP_SOC: RegisterAddress = RegisterAddress::low(0x06);
/// Die or thermistor temperature, depending on configuration.
pub const TEMP: RegisterAddress = RegisterAddress::low(0x08);
/// Lowest cell voltage of a pack, or the cell voltage for a single cell.
pub const VCELL: RegisterAddress = RegisterAddress::low(0x09);
pub const CURRENT: RegisterAddress = RegisterAddress::low(0x0A);
pub const AVG_CURRENT: RegisterAddress = RegisterAddress::low(0x0B);
/// Full capacity that goes with RepCap.
pub const FULL_CAP_REP: RegisterAddress = RegisterAddress::low(0x10);
pub const TTE: RegisterAddress = RegisterAddress::low(0x11);
/// Upper byte holds the maximum, lower byte the minimum current seen since the last reset.
pub const MAX_MIN_CURR: RegisterAddress = RegisterAddress::low(0x1C);
pub const TTF: RegisterAddress = RegisterAddress::low(0x20);
/// Averaging time constants. The low nibble sets the AvgCurrent window.
pub const FILTER_CFG: RegisterAddress = RegisterAddress::low(0x29);
pub const COMMAND: RegisterAddress = RegisterAddress::low(0x60);
pub const CONFIG2: RegisterAddress = RegisterAddress::low(0xBB);
pub const VCELL4: RegisterAddress = RegisterAddress::low(0xD5);
pub const VCELL3: RegisterAddress = RegisterAddress::low(VCELL3_OFFSET);
pub const VCELL2: RegisterAddress = RegisterAddress::low(0xD7);
pub const VCELL1: RegisterAddress = RegisterAddress::low(0xD8);
/// Pack voltage.
pub const BATT: RegisterAddress = RegisterAddress::low(0xDA);

pub const TEMP1: RegisterAddress = RegisterAddress::high(0x34);
/// Internal die temperature.
pub const TEMP_INT: RegisterAddress = RegisterAddress::high(0x35);
pub const TEMP2: RegisterAddress = RegisterAddress::high(0x3B);
pub const N_HIB_CFG: RegisterAddress = RegisterAddress::high(0xB4);
pub const N_PACK_CFG: RegisterAddress = RegisterAddress::high(0xB5);
/// First of the four 16-bit words of the 64-bit ROM ID.
pub const N_ROM_ID: RegisterAddress = RegisterAddress::high(0xBC);

#[cfg(not(feature = "legacy-cell3-alias"))]
const VCELL3_OFFSET: u8 = 0xD6;
#[cfg(feature = "legacy-cell3-alias")]
const VCELL3_OFFSET: u8 = 0xD7;

pub const RESET_COMMAND: u16 = 0x000F;
pub const CONFIG2_POR_CMD: u16 = 0x0001;
pub const MAX_MIN_CURR_RESET: u16 = 0x807F;
pub const HIBERNATE_CONFIG: u16 = 0x890B;

/// How a raw register value is turned into a physical quantity.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Conversion {
    /// `raw * lsb`
    Scale(f32),
    /// `raw / divisor`
    Divide(f32),
    /// `raw / divisor + offset`
    DivideOffset(f32, f32),
    /// `raw * lsb_uv / r_sense_mohm`, where `lsb_uv` is the register LSB measured across the sense
    /// resistor in μV (or μVh). The result is in mA (or mAh).
    SenseResistor(f32),
}

impl Conversion {
    #[inline]
    pub fn apply(self, value: f32, design: &DesignData) -> f32 {
        match self {
            Conversion::Scale(lsb) => value * lsb,
            Conversion::Divide(divisor) => value / divisor,
            Conversion::DivideOffset(divisor, offset) => value / divisor + offset,
            Conversion::SenseResistor(lsb_uv) => design.sense_uv_to_ma(value * lsb_uv),
        }
    }
}

/// A measurement register together with its signedness and unit conversion.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Descriptor {
    pub name: &'static str,
    pub unit: &'static str,
    pub register: RegisterAddress,
    pub signed: bool,
    pub conversion: Conversion,
}

impl Descriptor {
    pub fn convert(&self, raw: u16, design: &DesignData) -> f32 {
        let value = if self.signed {
            raw as i16 as f32
        } else {
            raw as f32
        };

        self.conversion.apply(value, design)
    }
}

macro_rules! measurements {
    ($($name:ident: $reg:ident, $unit:literal, $signed:literal, $conversion:expr;)+) => {
        $(
            pub const $name: Descriptor = Descriptor {
                name: stringify!($name),
                unit: $unit,
                register: $reg,
                signed: $signed,
                conversion: $conversion,
            };
        )+

        /// Every measurement register known to the driver.
        pub const MEASUREMENTS: &[Descriptor] = &[$($name),+];
    };
}

measurements! {
    VOLTAGE_MV:         VCELL,        "mV",  false, Conversion::Scale(0.078125);
    CELL1_VOLTAGE_MV:   VCELL1,       "mV",  false, Conversion::Scale(0.078125);
    CELL2_VOLTAGE_MV:   VCELL2,       "mV",  false, Conversion::Scale(0.078125);
    CELL3_VOLTAGE_MV:   VCELL3,       "mV",  false, Conversion::Scale(0.078125);
    CELL4_VOLTAGE_MV:   VCELL4,       "mV",  false, Conversion::Scale(0.078125);
    PACK_VOLTAGE_V:     BATT,         "V",   false, Conversion::Scale(0.00125);
    CURRENT_MA:         CURRENT,      "mA",  true,  Conversion::SenseResistor(1.5625);
    AVG_CURRENT_MA:     AVG_CURRENT,  "mA",  true,  Conversion::SenseResistor(1.5625);
    TEMPERATURE_C:      TEMP,         "C",   true,  Conversion::Divide(256.0);
    TEMP_INT_C:         TEMP_INT,     "C",   true,  Conversion::DivideOffset(10.0, -273.0);
    TEMP1_C:            TEMP1,        "C",   true,  Conversion::DivideOffset(10.0, -273.0);
    TEMP2_C:            TEMP2,        "C",   true,  Conversion::DivideOffset(10.0, -273.0);
    SOC_PERCENT:        REP_SOC,      "%",   false, Conversion::Divide(256.0);
    CAPACITY_MAH:       REP_CAP,      "mAh", false, Conversion::SenseResistor(5.0);
    FULL_CAPACITY_MAH:  FULL_CAP_REP, "mAh", false, Conversion::SenseResistor(5.0);
    TTE_S:              TTE,          "s",   false, Conversion::Scale(5.625);
    TTF_S:              TTF,          "s",   false, Conversion::Scale(5.625);
}

/// LSB of each half of MaxMinCurr, in μV across the sense resistor.
pub const MAX_MIN_CURRENT_LSB_UV: f32 = 400.0;

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn register_addresses_are_unique_within_a_space() {
        for (i, a) in MEASUREMENTS.iter().enumerate() {
            for b in &MEASUREMENTS[i + 1..] {
                let known_alias = cfg!(feature = "legacy-cell3-alias")
                    && a.name == "CELL2_VOLTAGE_MV"
                    && b.name == "CELL3_VOLTAGE_MV";
                if known_alias {
                    continue;
                }
                assert_ne!(a.register, b.register, "{} aliases {}", a.name, b.name);
            }
        }
    }

    #[test]
    fn conversions() {
        let design = DesignData::default();

        #[rustfmt::skip]
        let table: [(Descriptor, u16, f32); 15] = [
            (VOLTAGE_MV, 0x2000, 640.0),
            (CELL4_VOLTAGE_MV, 0x2000, 640.0),
            (PACK_VOLTAGE_V, 8000, 10.0),
            (SOC_PERCENT, 256, 1.0),
            (SOC_PERCENT, 0, 0.0),
            (TEMPERATURE_C, 2560, 10.0),
            (TEMPERATURE_C, (-256i16) as u16, -1.0),
            (TEMP_INT_C, 2980, 25.0),
            (TEMP1_C, (-10i16) as u16, -274.0),
            (TTE_S, 1, 5.625),
            (TTF_S, 0, 0.0),
            (CURRENT_MA, 0xFFFF, -0.15625),
            (AVG_CURRENT_MA, 64, 10.0),
            (CAPACITY_MAH, 2, 1.0),
            (FULL_CAPACITY_MAH, 6000, 3000.0),
        ];

        for (descriptor, raw, expected) in table {
            let value = descriptor.convert(raw, &design);
            assert!(
                (value - expected).abs() <= 1e-5 * expected.abs().max(1.0),
                "{} raw = {:#06x}: {} != {}",
                descriptor.name,
                raw,
                value,
                expected
            );
        }
    }

    #[test]
    fn soc_full_scale() {
        let soc = SOC_PERCENT.convert(0xFFFF, &DesignData::default());
        assert!((soc - 255.996).abs() < 0.001, "{soc}");
    }

    #[test]
    fn sense_resistor_scales_current() {
        let design = DesignData::from_milliohms(20);

        assert_eq!(CURRENT_MA.convert(0xFFFF, &design), -0.078125);
        assert_eq!(CAPACITY_MAH.convert(4, &design), 1.0);
    }
}
