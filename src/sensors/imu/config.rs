use serde::{Deserialize, Serialize};
use std::str::FromStr;

use super::registry;
use crate::error::Error;
use crate::sensors::baro::config::parse_u16;

/// Pleine échelle de l'accéléromètre (±g)
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "u16", into = "u16")]
pub enum AccelRange {
    G2,
    G4,
    G8,
    G16,
}

impl AccelRange {
    /// Code du registre ACCEL_CONFIG
    pub fn register_code(self) -> u8 {
        match self {
            AccelRange::G2 => registry::ACCEL_FSR_CFG_2G,
            AccelRange::G4 => registry::ACCEL_FSR_CFG_4G,
            AccelRange::G8 => registry::ACCEL_FSR_CFG_8G,
            AccelRange::G16 => registry::ACCEL_FSR_CFG_16G,
        }
    }

    pub fn g(self) -> u16 {
        match self {
            AccelRange::G2 => 2,
            AccelRange::G4 => 4,
            AccelRange::G8 => 8,
            AccelRange::G16 => 16,
        }
    }

    /// m/s² par LSB
    pub fn scale(self) -> f64 {
        registry::GRAVITY * self.g() as f64 / registry::RAW_FULL_SCALE
    }
}

impl TryFrom<u16> for AccelRange {
    type Error = Error;

    fn try_from(g: u16) -> Result<Self, Self::Error> {
        match g {
            2 => Ok(AccelRange::G2),
            4 => Ok(AccelRange::G4),
            8 => Ok(AccelRange::G8),
            16 => Ok(AccelRange::G16),
            _ => Err(Error::InvalidParameter(format!(
                "pleine échelle accéléromètre ±{}g inconnue (2, 4, 8, 16)",
                g
            ))),
        }
    }
}

impl From<AccelRange> for u16 {
    fn from(value: AccelRange) -> Self {
        value.g()
    }
}

impl FromStr for AccelRange {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_u16(s)?.try_into()
    }
}

/// Pleine échelle du gyroscope (±°/s)
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "u16", into = "u16")]
pub enum GyroRange {
    Dps250,
    Dps500,
    Dps1000,
    Dps2000,
}

impl GyroRange {
    /// Code du registre GYRO_CONFIG, DLPF actif
    pub fn register_code(self) -> u8 {
        let fsr = match self {
            GyroRange::Dps250 => registry::GYRO_FSR_CFG_250,
            GyroRange::Dps500 => registry::GYRO_FSR_CFG_500,
            GyroRange::Dps1000 => registry::GYRO_FSR_CFG_1000,
            GyroRange::Dps2000 => registry::GYRO_FSR_CFG_2000,
        };
        fsr | registry::FCHOICE_B_DLPF_EN
    }

    pub fn dps(self) -> u16 {
        match self {
            GyroRange::Dps250 => 250,
            GyroRange::Dps500 => 500,
            GyroRange::Dps1000 => 1000,
            GyroRange::Dps2000 => 2000,
        }
    }

    /// °/s par LSB
    pub fn scale(self) -> f64 {
        self.dps() as f64 / registry::RAW_FULL_SCALE
    }
}

impl TryFrom<u16> for GyroRange {
    type Error = Error;

    fn try_from(dps: u16) -> Result<Self, Self::Error> {
        match dps {
            250 => Ok(GyroRange::Dps250),
            500 => Ok(GyroRange::Dps500),
            1000 => Ok(GyroRange::Dps1000),
            2000 => Ok(GyroRange::Dps2000),
            _ => Err(Error::InvalidParameter(format!(
                "pleine échelle gyroscope ±{}°/s inconnue (250, 500, 1000, 2000)",
                dps
            ))),
        }
    }
}

impl From<GyroRange> for u16 {
    fn from(value: GyroRange) -> Self {
        value.dps()
    }
}

impl FromStr for GyroRange {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_u16(s)?.try_into()
    }
}

/// Bande passante du filtre passe-bas de l'accéléromètre (Hz, 0 = désactivé)
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "u16", into = "u16")]
pub enum AccelBandwidth {
    Off,
    Hz460,
    Hz184,
    Hz92,
    Hz41,
    Hz20,
    Hz10,
    Hz5,
}

impl AccelBandwidth {
    /// Code du registre ACCEL_CONFIG_2.
    /// Désactivé: chemin d'échantillonnage à 4 kHz.
    pub fn register_code(self) -> u8 {
        let base = registry::ACCEL_FCHOICE_1KHZ | registry::BIT_FIFO_SIZE_1024;
        match self {
            AccelBandwidth::Off => registry::ACCEL_FCHOICE_4KHZ | registry::BIT_FIFO_SIZE_1024,
            AccelBandwidth::Hz460 => base,
            AccelBandwidth::Hz184 => base | 1,
            AccelBandwidth::Hz92 => base | 2,
            AccelBandwidth::Hz41 => base | 3,
            AccelBandwidth::Hz20 => base | 4,
            AccelBandwidth::Hz10 => base | 5,
            AccelBandwidth::Hz5 => base | 6,
        }
    }

    pub fn hz(self) -> u16 {
        match self {
            AccelBandwidth::Off => 0,
            AccelBandwidth::Hz460 => 460,
            AccelBandwidth::Hz184 => 184,
            AccelBandwidth::Hz92 => 92,
            AccelBandwidth::Hz41 => 41,
            AccelBandwidth::Hz20 => 20,
            AccelBandwidth::Hz10 => 10,
            AccelBandwidth::Hz5 => 5,
        }
    }
}

impl TryFrom<u16> for AccelBandwidth {
    type Error = Error;

    fn try_from(hz: u16) -> Result<Self, Self::Error> {
        match hz {
            0 => Ok(AccelBandwidth::Off),
            460 => Ok(AccelBandwidth::Hz460),
            184 => Ok(AccelBandwidth::Hz184),
            92 => Ok(AccelBandwidth::Hz92),
            41 => Ok(AccelBandwidth::Hz41),
            20 => Ok(AccelBandwidth::Hz20),
            10 => Ok(AccelBandwidth::Hz10),
            5 => Ok(AccelBandwidth::Hz5),
            _ => Err(Error::InvalidParameter(format!(
                "filtre accéléromètre {} Hz inconnu (0, 460, 184, 92, 41, 20, 10, 5)",
                hz
            ))),
        }
    }
}

impl From<AccelBandwidth> for u16 {
    fn from(value: AccelBandwidth) -> Self {
        value.hz()
    }
}

impl FromStr for AccelBandwidth {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_u16(s)?.try_into()
    }
}

/// Bande passante du filtre passe-bas du gyroscope (Hz, 0 = désactivé)
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "u16", into = "u16")]
pub enum GyroBandwidth {
    Off,
    Hz250,
    Hz184,
    Hz92,
    Hz41,
    Hz20,
    Hz10,
    Hz5,
}

impl GyroBandwidth {
    /// Code du registre CONFIG
    pub fn register_code(self) -> u8 {
        let dlpf = match self {
            GyroBandwidth::Off => 7,
            GyroBandwidth::Hz250 => 0,
            GyroBandwidth::Hz184 => 1,
            GyroBandwidth::Hz92 => 2,
            GyroBandwidth::Hz41 => 3,
            GyroBandwidth::Hz20 => 4,
            GyroBandwidth::Hz10 => 5,
            GyroBandwidth::Hz5 => 6,
        };
        registry::FIFO_MODE_REPLACE_OLD | dlpf
    }

    pub fn hz(self) -> u16 {
        match self {
            GyroBandwidth::Off => 0,
            GyroBandwidth::Hz250 => 250,
            GyroBandwidth::Hz184 => 184,
            GyroBandwidth::Hz92 => 92,
            GyroBandwidth::Hz41 => 41,
            GyroBandwidth::Hz20 => 20,
            GyroBandwidth::Hz10 => 10,
            GyroBandwidth::Hz5 => 5,
        }
    }
}

impl TryFrom<u16> for GyroBandwidth {
    type Error = Error;

    fn try_from(hz: u16) -> Result<Self, Self::Error> {
        match hz {
            0 => Ok(GyroBandwidth::Off),
            250 => Ok(GyroBandwidth::Hz250),
            184 => Ok(GyroBandwidth::Hz184),
            92 => Ok(GyroBandwidth::Hz92),
            41 => Ok(GyroBandwidth::Hz41),
            20 => Ok(GyroBandwidth::Hz20),
            10 => Ok(GyroBandwidth::Hz10),
            5 => Ok(GyroBandwidth::Hz5),
            _ => Err(Error::InvalidParameter(format!(
                "filtre gyroscope {} Hz inconnu (0, 250, 184, 92, 41, 20, 10, 5)",
                hz
            ))),
        }
    }
}

impl From<GyroBandwidth> for u16 {
    fn from(value: GyroBandwidth) -> Self {
        value.hz()
    }
}

impl FromStr for GyroBandwidth {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_u16(s)?.try_into()
    }
}

/// Configuration initiale de la centrale inertielle
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ImuConfig {
    pub bus: u8,
    pub address: u8,
    /// None: diviseur à 0 (fréquence maximale)
    pub sample_rate_hz: Option<u16>,
    pub accel_range: AccelRange,
    pub gyro_range: GyroRange,
    pub accel_bandwidth: AccelBandwidth,
    pub gyro_bandwidth: GyroBandwidth,
    /// Démarre aussi le magnétomètre (variante 9 axes)
    pub magnetometer: bool,
}

impl Default for ImuConfig {
    fn default() -> Self {
        ImuConfig {
            bus: 2,
            address: registry::MPU9250_ADDR,
            sample_rate_hz: None,
            accel_range: AccelRange::G8,
            gyro_range: GyroRange::Dps2000,
            accel_bandwidth: AccelBandwidth::Hz184,
            gyro_bandwidth: GyroBandwidth::Hz184,
            magnetometer: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn range_codes_and_scales() {
        assert_eq!(AccelRange::G8.register_code(), 0x10);
        assert_eq!(AccelRange::G2.scale(), 9.80665 * 2.0 / 32768.0);
        assert_eq!(AccelRange::G16.scale(), 9.80665 * 16.0 / 32768.0);

        assert_eq!(GyroRange::Dps2000.register_code(), 0x18);
        assert_eq!(GyroRange::Dps250.scale(), 250.0 / 32768.0);
        assert_eq!(GyroRange::Dps1000.scale(), 1000.0 / 32768.0);
    }

    #[test]
    fn filter_codes() {
        assert_eq!(AccelBandwidth::Off.register_code(), 0x48);
        assert_eq!(AccelBandwidth::Hz460.register_code(), 0x40);
        assert_eq!(AccelBandwidth::Hz184.register_code(), 0x41);
        assert_eq!(AccelBandwidth::Hz5.register_code(), 0x46);

        assert_eq!(GyroBandwidth::Off.register_code(), 0x07);
        assert_eq!(GyroBandwidth::Hz250.register_code(), 0x00);
        assert_eq!(GyroBandwidth::Hz184.register_code(), 0x01);
        assert_eq!(GyroBandwidth::Hz5.register_code(), 0x06);
    }

    #[test]
    fn out_of_table_values_are_rejected() {
        assert!(matches!(AccelRange::try_from(3), Err(Error::InvalidParameter(_))));
        assert!(matches!(GyroRange::try_from(125), Err(Error::InvalidParameter(_))));
        assert!(matches!(AccelBandwidth::try_from(250), Err(Error::InvalidParameter(_))));
        assert!(matches!(GyroBandwidth::try_from(460), Err(Error::InvalidParameter(_))));
        assert_eq!("16".parse::<AccelRange>().unwrap(), AccelRange::G16);
        assert_eq!(" 92 ".parse::<GyroBandwidth>().unwrap(), GyroBandwidth::Hz92);
    }
}
