use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::sensors::baro::BarometerConfig;
use crate::sensors::imu::ImuConfig;

/// Fréquence d'acquisition maximale de la boucle (Hz)
pub const MAX_RATE_HZ: u16 = 1000;

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq)]
pub struct Config {
    /// None: capteur de pression non utilisé
    pub barometer: Option<BarometerConfig>,
    pub imu: ImuConfig,
    /// Fréquence de la boucle d'acquisition
    pub rate_hz: u16,
    /// Pression de référence au niveau de la mer (Pa)
    pub sea_level_pa: f64,
}

impl Config {
    /// Valeurs par défaut pour une BeagleBone Blue (bus 2)
    pub fn new() -> Self {
        let config = Config {
            barometer: Some(BarometerConfig::default()),
            imu: ImuConfig::default(),
            rate_hz: 100,
            sea_level_pa: 101325.0,
        };

        config
    }

    pub fn validate(&self) -> Result<()> {
        if self.rate_hz == 0 || self.rate_hz > MAX_RATE_HZ {
            return Err(Error::InvalidParameter(format!(
                "fréquence d'acquisition {} Hz (1-{} Hz)",
                self.rate_hz, MAX_RATE_HZ
            )));
        }

        if !self.sea_level_pa.is_finite() || self.sea_level_pa <= 0.0 {
            return Err(Error::InvalidParameter(format!(
                "pression de référence {} Pa",
                self.sea_level_pa
            )));
        }

        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sensors::imu::{AccelRange, GyroBandwidth};

    #[test]
    fn defaults_target_beaglebone_blue() {
        let config = Config::new();
        assert!(config.validate().is_ok());
        assert_eq!(config.imu.bus, 2);
        assert_eq!(config.imu.address, 0x68);
        assert_eq!(config.barometer.map(|b| b.address), Some(0x76));
        assert_eq!(config.imu.accel_range, AccelRange::G8);
        assert_eq!(config.imu.gyro_bandwidth, GyroBandwidth::Hz184);
        assert!(config.imu.magnetometer);
    }

    #[test]
    fn validation() {
        let config = Config {
            rate_hz: 0,
            ..Config::new()
        };
        assert!(matches!(config.validate(), Err(Error::InvalidParameter(_))));

        let config = Config {
            sea_level_pa: -1.0,
            ..Config::new()
        };
        assert!(matches!(config.validate(), Err(Error::InvalidParameter(_))));
    }
}
