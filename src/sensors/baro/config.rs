use serde::{Deserialize, Serialize};
use std::str::FromStr;

use super::registry;
use crate::error::Error;

/// Sur-échantillonnage de la pression (la température reste à 1×)
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "u16", into = "u16")]
pub enum PressureOversampling {
    X1,
    X2,
    X4,
    X8,
    X16,
}

impl PressureOversampling {
    /// Bits osrs_p du registre CTRL_MEAS
    pub fn register_value(self) -> u8 {
        match self {
            PressureOversampling::X1 => registry::BMP_OVERSAMPLE_1,
            PressureOversampling::X2 => registry::BMP_OVERSAMPLE_2,
            PressureOversampling::X4 => registry::BMP_OVERSAMPLE_4,
            PressureOversampling::X8 => registry::BMP_OVERSAMPLE_8,
            PressureOversampling::X16 => registry::BMP_OVERSAMPLE_16,
        }
    }

    pub fn factor(self) -> u16 {
        match self {
            PressureOversampling::X1 => 1,
            PressureOversampling::X2 => 2,
            PressureOversampling::X4 => 4,
            PressureOversampling::X8 => 8,
            PressureOversampling::X16 => 16,
        }
    }
}

impl TryFrom<u16> for PressureOversampling {
    type Error = Error;

    fn try_from(factor: u16) -> Result<Self, Self::Error> {
        match factor {
            1 => Ok(PressureOversampling::X1),
            2 => Ok(PressureOversampling::X2),
            4 => Ok(PressureOversampling::X4),
            8 => Ok(PressureOversampling::X8),
            16 => Ok(PressureOversampling::X16),
            _ => Err(Error::InvalidParameter(format!(
                "sur-échantillonnage {}× inconnu (1, 2, 4, 8, 16)",
                factor
            ))),
        }
    }
}

impl From<PressureOversampling> for u16 {
    fn from(value: PressureOversampling) -> Self {
        value.factor()
    }
}

impl FromStr for PressureOversampling {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_u16(s)?.try_into()
    }
}

/// Coefficient du filtre IIR (0 = désactivé)
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "u16", into = "u16")]
pub enum FilterCoefficient {
    Off,
    X2,
    X4,
    X8,
    X16,
}

impl FilterCoefficient {
    /// Bits filter du registre CONFIG
    pub fn register_value(self) -> u8 {
        match self {
            FilterCoefficient::Off => registry::BMP_FILTER_OFF,
            FilterCoefficient::X2 => registry::BMP_FILTER_2,
            FilterCoefficient::X4 => registry::BMP_FILTER_4,
            FilterCoefficient::X8 => registry::BMP_FILTER_8,
            FilterCoefficient::X16 => registry::BMP_FILTER_16,
        }
    }

    pub fn coefficient(self) -> u16 {
        match self {
            FilterCoefficient::Off => 0,
            FilterCoefficient::X2 => 2,
            FilterCoefficient::X4 => 4,
            FilterCoefficient::X8 => 8,
            FilterCoefficient::X16 => 16,
        }
    }
}

impl TryFrom<u16> for FilterCoefficient {
    type Error = Error;

    fn try_from(coefficient: u16) -> Result<Self, Self::Error> {
        match coefficient {
            0 => Ok(FilterCoefficient::Off),
            2 => Ok(FilterCoefficient::X2),
            4 => Ok(FilterCoefficient::X4),
            8 => Ok(FilterCoefficient::X8),
            16 => Ok(FilterCoefficient::X16),
            _ => Err(Error::InvalidParameter(format!(
                "coefficient de filtre {} inconnu (0, 2, 4, 8, 16)",
                coefficient
            ))),
        }
    }
}

impl From<FilterCoefficient> for u16 {
    fn from(value: FilterCoefficient) -> Self {
        value.coefficient()
    }
}

impl FromStr for FilterCoefficient {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_u16(s)?.try_into()
    }
}

pub(crate) fn parse_u16(s: &str) -> Result<u16, Error> {
    s.trim()
        .parse::<u16>()
        .map_err(|e| Error::InvalidParameter(format!("'{}': {}", s, e)))
}

/// Configuration du capteur de pression, figée à la construction du pilote
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct BarometerConfig {
    pub bus: u8,
    pub address: u8,
    pub oversampling: PressureOversampling,
    pub filter: FilterCoefficient,
}

impl Default for BarometerConfig {
    fn default() -> Self {
        BarometerConfig {
            bus: 2,
            address: registry::BMP280_ADDR,
            oversampling: PressureOversampling::X16,
            filter: FilterCoefficient::Off,
        }
    }
}

impl BarometerConfig {
    /// Octet CTRL_MEAS: mode continu, température 1×, pression selon la configuration
    pub fn ctrl_meas(&self) -> u8 {
        registry::BMP_MODE_NORMAL | registry::BMP_TEMP_OVERSAMPLE_1 | self.oversampling.register_value()
    }

    /// Octet CONFIG: standby minimal et filtre selon la configuration
    pub fn config_byte(&self) -> u8 {
        registry::BMP280_TSB_0 | self.filter.register_value()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn control_bytes() {
        let config = BarometerConfig::default();
        assert_eq!(config.ctrl_meas(), 0x37);
        assert_eq!(config.config_byte(), 0x00);

        let config = BarometerConfig {
            oversampling: PressureOversampling::X1,
            filter: FilterCoefficient::X16,
            ..BarometerConfig::default()
        };
        assert_eq!(config.ctrl_meas(), 0x27);
        assert_eq!(config.config_byte(), 0x10);
    }

    #[test]
    fn unknown_values_are_rejected() {
        assert!(matches!(PressureOversampling::try_from(3), Err(Error::InvalidParameter(_))));
        assert!(matches!(FilterCoefficient::try_from(1), Err(Error::InvalidParameter(_))));
        assert!(matches!("abc".parse::<FilterCoefficient>(), Err(Error::InvalidParameter(_))));
        assert_eq!("8".parse::<PressureOversampling>().unwrap(), PressureOversampling::X8);
    }
}
