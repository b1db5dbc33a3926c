use clap::Parser;

use beaglesensors::config::Config;
use beaglesensors::sensors::baro::{FilterCoefficient, PressureOversampling};
use beaglesensors::sensors::imu::{AccelBandwidth, AccelRange, GyroBandwidth, GyroRange};

/// Acquisition BMP280 + MPU9250 sur bus I2C
#[derive(Debug, Parser, Clone)]
#[command(version, about)]
pub struct Cli {
    /// Numéro du bus I2C (/dev/i2c-N)
    #[arg(long)]
    pub bus: Option<u8>,

    /// Fréquence de la boucle d'acquisition (Hz)
    #[arg(long)]
    pub rate: Option<u16>,

    /// Fréquence d'échantillonnage du MPU9250 (4-1000 Hz)
    #[arg(long)]
    pub sample_rate: Option<u16>,

    /// Pleine échelle accéléromètre: 2, 4, 8, 16 (g)
    #[arg(long)]
    pub accel_range: Option<AccelRange>,

    /// Pleine échelle gyroscope: 250, 500, 1000, 2000 (°/s)
    #[arg(long)]
    pub gyro_range: Option<GyroRange>,

    /// Filtre accéléromètre: 0 (off), 460, 184, 92, 41, 20, 10, 5 (Hz)
    #[arg(long)]
    pub accel_bandwidth: Option<AccelBandwidth>,

    /// Filtre gyroscope: 0 (off), 250, 184, 92, 41, 20, 10, 5 (Hz)
    #[arg(long)]
    pub gyro_bandwidth: Option<GyroBandwidth>,

    /// Sur-échantillonnage pression: 1, 2, 4, 8, 16
    #[arg(long)]
    pub oversampling: Option<PressureOversampling>,

    /// Filtre IIR pression: 0 (off), 2, 4, 8, 16
    #[arg(long)]
    pub filter: Option<FilterCoefficient>,

    /// Pression au niveau de la mer (Pa)
    #[arg(long)]
    pub sea_level: Option<f64>,

    /// Variante 6 axes, sans magnétomètre
    #[arg(long)]
    pub no_mag: bool,

    /// Sans capteur de pression
    #[arg(long)]
    pub no_baro: bool,
}

impl Cli {
    /// Applique les options sur la configuration par défaut
    pub fn into_config(self) -> beaglesensors::Result<Config> {
        let mut config = Config::new();

        if let Some(bus) = self.bus {
            config.imu.bus = bus;
        }
        config.imu.sample_rate_hz = self.sample_rate.or(config.imu.sample_rate_hz);
        config.imu.accel_range = self.accel_range.unwrap_or(config.imu.accel_range);
        config.imu.gyro_range = self.gyro_range.unwrap_or(config.imu.gyro_range);
        config.imu.accel_bandwidth = self.accel_bandwidth.unwrap_or(config.imu.accel_bandwidth);
        config.imu.gyro_bandwidth = self.gyro_bandwidth.unwrap_or(config.imu.gyro_bandwidth);
        config.imu.magnetometer = !self.no_mag;

        config.barometer = if self.no_baro {
            None
        } else {
            config.barometer.map(|mut baro| {
                baro.bus = self.bus.unwrap_or(baro.bus);
                baro.oversampling = self.oversampling.unwrap_or(baro.oversampling);
                baro.filter = self.filter.unwrap_or(baro.filter);
                baro
            })
        };

        config.rate_hz = self.rate.unwrap_or(config.rate_hz);
        config.sea_level_pa = self.sea_level.unwrap_or(config.sea_level_pa);

        config.validate()?;
        Ok(config)
    }
}
