use embedded_hal::delay::DelayNs;
use log::{debug, error, info};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::i2c::{DeviceHandle, RegisterBus};
use crate::sensors::{Lifecycle, Triplet};

pub mod compensation;
pub mod config;
pub mod magnetometer;
pub(crate) mod registry;

pub use compensation::MagAdjustment;
pub use config::{AccelBandwidth, AccelRange, GyroBandwidth, GyroRange, ImuConfig};
pub use magnetometer::Ak8963;

/// Etapes de l'initialisation du MPU9250, dans l'ordre
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ImuStage {
    Reset,
    IdentityVerified,
    SampleRateSet,
    AccelRangeSet,
    GyroRangeSet,
    AccelFilterSet,
    GyroFilterSet,
    MagnetometerInitialized,
}

/// Facteurs d'échelle issus des pleines échelles sélectionnées
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ScaleConfig {
    /// m/s² par LSB
    pub accel: f64,
    /// °/s par LSB
    pub gyro: f64,
}

impl ScaleConfig {
    pub fn new(accel: AccelRange, gyro: GyroRange) -> Self {
        ScaleConfig {
            accel: accel.scale(),
            gyro: gyro.scale(),
        }
    }
}

/// Données disponibles une fois la centrale prête
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ImuReady {
    pub scale: ScaleConfig,
    /// Absent en variante 6 axes
    pub magnetometer: Option<Ak8963>,
}

pub type ImuState = Lifecycle<ImuStage, ImuReady>;

/// Pilote de la centrale inertielle MPU9250 (accéléromètre, gyroscope, magnétomètre AK8963)
pub struct Mpu9250<B, D> {
    bus: B,
    delay: D,
    device: DeviceHandle,
    config: ImuConfig,
    sample_rate_divider: u8,
    state: ImuState,
}

impl<B: RegisterBus, D: DelayNs> Mpu9250<B, D> {
    /// Constructeur. La configuration est validée ici, avant tout accès au bus.
    pub fn new(bus: B, delay: D, config: ImuConfig) -> Result<Self> {
        let device = DeviceHandle::new(config.bus, config.address)?;
        let sample_rate_divider = match config.sample_rate_hz {
            Some(rate) => compensation::sample_rate_divider(rate)?,
            None => 0,
        };

        Ok(Self {
            bus,
            delay,
            device,
            config,
            sample_rate_divider,
            state: Lifecycle::Uninitialized,
        })
    }

    pub fn state(&self) -> &ImuState {
        &self.state
    }

    /// Configuration courante (mise à jour par les `set_*`)
    pub fn config(&self) -> &ImuConfig {
        &self.config
    }

    pub fn device(&self) -> DeviceHandle {
        self.device
    }

    pub fn scale(&self) -> Option<ScaleConfig> {
        self.ready().ok().map(|ready| ready.scale)
    }

    pub fn release(self) -> B {
        self.bus
    }

    fn ready(&self) -> Result<&ImuReady> {
        match &self.state {
            Lifecycle::Ready(ready) => Ok(ready),
            _ => Err(Error::InvalidState("centrale non initialisée")),
        }
    }

    fn ready_mut(&mut self) -> Result<&mut ImuReady> {
        match &mut self.state {
            Lifecycle::Ready(ready) => Ok(ready),
            _ => Err(Error::InvalidState("centrale non initialisée")),
        }
    }

    /// Séquence d'initialisation complète. Un échec est définitif pour cette instance.
    pub fn init(&mut self) -> Result<()> {
        match self.state {
            Lifecycle::Uninitialized => {}
            Lifecycle::Ready(_) => return Ok(()),
            Lifecycle::Configuring(_) | Lifecycle::Failed(_) => {
                return Err(Error::InvalidState("initialisation déjà tentée"))
            }
        }

        info!("[MPU9250] Initialisation (adresse {:#04x}) ...", self.device.address());

        match self.run_init() {
            Ok(ready) => {
                info!("[MPU9250] Echelles: {:?}", ready.scale);
                if let Some(mag) = &ready.magnetometer {
                    info!("[AK8963] Ajustement: {:?}", mag.adjustment());
                }
                self.state = Lifecycle::Ready(ready);
                Ok(())
            }
            Err(e) => {
                let stage = match self.state {
                    Lifecycle::Configuring(stage) => stage,
                    _ => ImuStage::Reset,
                };
                error!("[MPU9250] Echec à l'étape {:?}: {}", stage, e);
                self.state = Lifecycle::Failed(stage);
                Err(e)
            }
        }
    }

    fn advance(&mut self, stage: ImuStage) {
        debug!("[MPU9250] Etape {:?}", stage);
        self.state = Lifecycle::Configuring(stage);
    }

    fn write(&mut self, register: u8, value: u8) -> Result<()> {
        self.bus.write_register(self.device.address(), register, value)
    }

    fn run_init(&mut self) -> Result<ImuReady> {
        // Deux resets espacés, le premier ne suffit pas toujours
        self.advance(ImuStage::Reset);
        for _ in 0..2 {
            self.write(registry::MPU9250_PWR_MGMT_1, registry::MPU9250_H_RESET)?;
            self.delay.delay_ms(registry::RESET_DELAY_MS);
        }

        self.advance(ImuStage::IdentityVerified);
        let identity = self
            .bus
            .read_register(self.device.address(), registry::MPU9250_IDENTITY_REG)?;
        if identity != registry::MPU9250_IDENTITY {
            return Err(Error::IdentityMismatch {
                expected: registry::MPU9250_IDENTITY,
                found: identity,
            });
        }

        self.advance(ImuStage::SampleRateSet);
        self.write(registry::MPU9250_SMPLRT_DIV, self.sample_rate_divider)?;

        self.advance(ImuStage::AccelRangeSet);
        self.write(registry::MPU9250_ACCEL_CONFIG, self.config.accel_range.register_code())?;

        self.advance(ImuStage::GyroRangeSet);
        self.write(registry::MPU9250_GYRO_CONFIG, self.config.gyro_range.register_code())?;

        self.advance(ImuStage::AccelFilterSet);
        self.write(
            registry::MPU9250_ACCEL_CONFIG_2,
            self.config.accel_bandwidth.register_code(),
        )?;

        self.advance(ImuStage::GyroFilterSet);
        self.write(registry::MPU9250_CONFIG, self.config.gyro_bandwidth.register_code())?;

        let magnetometer = if self.config.magnetometer {
            self.advance(ImuStage::MagnetometerInitialized);
            // Maître I2C interne coupé, AK8963 exposé sur le bus
            self.write(registry::MPU9250_USER_CTRL, registry::MPU9250_USER_CTRL_DEFAULT)?;
            self.write(registry::MPU9250_INT_PIN_CFG, registry::MPU9250_BYPASS_EN)?;
            Some(Ak8963::bring_up(&mut self.bus, &mut self.delay)?)
        } else {
            None
        };

        self.delay.delay_ms(registry::CONFIG_SETTLE_MS);

        Ok(ImuReady {
            scale: ScaleConfig::new(self.config.accel_range, self.config.gyro_range),
            magnetometer,
        })
    }

    /// Change la fréquence d'échantillonnage (4 à 1000 Hz)
    pub fn set_sample_rate(&mut self, rate_hz: u16) -> Result<()> {
        self.ready()?;
        let divider = compensation::sample_rate_divider(rate_hz)?;

        self.write(registry::MPU9250_SMPLRT_DIV, divider)?;
        self.sample_rate_divider = divider;
        self.config.sample_rate_hz = Some(rate_hz);
        debug!("[MPU9250] Fréquence {} Hz (diviseur {})", rate_hz, divider);
        Ok(())
    }

    /// Change la pleine échelle de l'accéléromètre.
    /// Le facteur d'échelle n'est modifié qu'après l'écriture du registre.
    pub fn set_accel_range(&mut self, range: AccelRange) -> Result<()> {
        self.ready()?;
        self.write(registry::MPU9250_ACCEL_CONFIG, range.register_code())?;

        self.ready_mut()?.scale.accel = range.scale();
        self.config.accel_range = range;
        Ok(())
    }

    /// Change la pleine échelle du gyroscope
    pub fn set_gyro_range(&mut self, range: GyroRange) -> Result<()> {
        self.ready()?;
        self.write(registry::MPU9250_GYRO_CONFIG, range.register_code())?;

        self.ready_mut()?.scale.gyro = range.scale();
        self.config.gyro_range = range;
        Ok(())
    }

    pub fn set_accel_bandwidth(&mut self, bandwidth: AccelBandwidth) -> Result<()> {
        self.ready()?;
        self.write(registry::MPU9250_ACCEL_CONFIG_2, bandwidth.register_code())?;
        self.config.accel_bandwidth = bandwidth;
        Ok(())
    }

    pub fn set_gyro_bandwidth(&mut self, bandwidth: GyroBandwidth) -> Result<()> {
        self.ready()?;
        self.write(registry::MPU9250_CONFIG, bandwidth.register_code())?;
        self.config.gyro_bandwidth = bandwidth;
        Ok(())
    }

    fn read_axes(&mut self, register: u8) -> Result<[i16; 3]> {
        let mut raw = [0u8; registry::MPU9250_DATA_LEN];
        self.bus.read_block(self.device.address(), register, &mut raw)?;
        Ok(compensation::decode_be_axes(&raw))
    }

    /// Accélération en m/s²
    pub fn read_acceleration(&mut self) -> Result<Triplet> {
        let scale = self.ready()?.scale.accel;
        let raw = self.read_axes(registry::MPU9250_ACCEL_XOUT_H)?;
        Ok(compensation::scale_axes(raw, scale))
    }

    /// Vitesse angulaire en °/s
    pub fn read_angular_rate(&mut self) -> Result<Triplet> {
        let scale = self.ready()?.scale.gyro;
        let raw = self.read_axes(registry::MPU9250_GYRO_XOUT_H)?;
        Ok(compensation::scale_axes(raw, scale))
    }

    /// Champ magnétique en µT (variante 9 axes seulement)
    pub fn read_magnetic_field(&mut self) -> Result<Triplet> {
        let magnetometer = self
            .ready()?
            .magnetometer
            .ok_or(Error::InvalidState("magnétomètre non initialisé"))?;
        magnetometer.read(&mut self.bus)
    }
}
