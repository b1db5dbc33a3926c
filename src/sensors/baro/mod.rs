use embedded_hal::delay::DelayNs;
use log::{debug, error, info};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{Error, Result};
use crate::i2c::{DeviceHandle, RegisterBus};
use crate::sensors::Lifecycle;

pub mod compensation;
pub mod config;
pub(crate) mod registry;

pub use compensation::Calibration;
pub use config::{BarometerConfig, FilterCoefficient, PressureOversampling};

/// Etapes de l'initialisation du BMP280, dans l'ordre.
/// Pendant `Configuring(étape)`, l'étape nommée est celle en cours.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BaroStage {
    Reset,
    IdentityVerified,
    MeasurementConfigured,
    FilterConfigured,
    CalibrationReady,
    CalibrationLoaded,
}

pub type BaroState = Lifecycle<BaroStage, Calibration>;

/// Mesure compensée du capteur de pression
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct BarometerSample {
    /// °C
    pub temperature: f64,
    /// hPa
    pub pressure: f64,
    /// m, relative à la pression de référence au niveau de la mer
    pub altitude: f64,
}

impl fmt::Display for BarometerSample {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "T: {:.2}°C P: {:.2} hPa Alt: {:.2} m",
            self.temperature, self.pressure, self.altitude
        )
    }
}

/// Pilote du capteur de pression/température BMP280
pub struct Bmp280<B, D> {
    bus: B,
    delay: D,
    device: DeviceHandle,
    config: BarometerConfig,
    state: BaroState,
}

impl<B: RegisterBus, D: DelayNs> Bmp280<B, D> {
    /// Constructeur, aucun accès au bus avant `init`
    pub fn new(bus: B, delay: D, config: BarometerConfig) -> Result<Self> {
        let device = DeviceHandle::new(config.bus, config.address)?;

        Ok(Self {
            bus,
            delay,
            device,
            config,
            state: Lifecycle::Uninitialized,
        })
    }

    pub fn state(&self) -> &BaroState {
        &self.state
    }

    pub fn config(&self) -> &BarometerConfig {
        &self.config
    }

    pub fn device(&self) -> DeviceHandle {
        self.device
    }

    /// Constantes de calibration, disponibles seulement une fois prêt
    pub fn calibration(&self) -> Option<&Calibration> {
        match &self.state {
            Lifecycle::Ready(cal) => Some(cal),
            _ => None,
        }
    }

    /// Rend le bus
    pub fn release(self) -> B {
        self.bus
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

        info!("[BMP280] Initialisation (adresse {:#04x}) ...", self.device.address());

        match self.run_init() {
            Ok(cal) => {
                info!("[BMP280] Calibration: {:?}", cal);
                self.state = Lifecycle::Ready(cal);
                Ok(())
            }
            Err(e) => {
                let stage = match self.state {
                    Lifecycle::Configuring(stage) => stage,
                    _ => BaroStage::Reset,
                };
                error!("[BMP280] Echec à l'étape {:?}: {}", stage, e);
                self.state = Lifecycle::Failed(stage);
                Err(e)
            }
        }
    }

    fn advance(&mut self, stage: BaroStage) {
        debug!("[BMP280] Etape {:?}", stage);
        self.state = Lifecycle::Configuring(stage);
    }

    fn run_init(&mut self) -> Result<Calibration> {
        let addr = self.device.address();

        self.advance(BaroStage::Reset);
        self.bus
            .write_register(addr, registry::BMP280_RESET_REG, registry::BMP280_RESET_WORD)?;

        // Vérifie qu'il s'agit bien d'un BMP280
        self.advance(BaroStage::IdentityVerified);
        let chip_id = self.bus.read_register(addr, registry::BMP280_CHIP_ID_REG)?;
        if chip_id != registry::BMP280_CHIP_ID {
            return Err(Error::IdentityMismatch {
                expected: registry::BMP280_CHIP_ID,
                found: chip_id,
            });
        }

        self.advance(BaroStage::MeasurementConfigured);
        self.bus
            .write_register(addr, registry::BMP280_CTRL_MEAS, self.config.ctrl_meas())?;

        self.advance(BaroStage::FilterConfigured);
        self.bus
            .write_register(addr, registry::BMP280_CONFIG, self.config.config_byte())?;

        self.advance(BaroStage::CalibrationReady);
        self.wait_calibration_ready()?;

        // Toute la NVM d'usine en une seule lecture
        self.advance(BaroStage::CalibrationLoaded);
        let mut nvm = [0u8; registry::BMP280_CALIBRATION_LEN];
        self.bus.read_block(addr, registry::BMP280_DIG_T1, &mut nvm)?;
        let cal = Calibration::from_nvm(&nvm);

        self.delay.delay_ms(registry::CALIBRATION_SETTLE_MS);
        Ok(cal)
    }

    /// Attend que la copie de la NVM soit terminée (bit im_update à 0)
    fn wait_calibration_ready(&mut self) -> Result<()> {
        let addr = self.device.address();

        for attempt in 1..=registry::CALIBRATION_POLL_ATTEMPTS {
            self.delay.delay_ms(registry::CALIBRATION_POLL_DELAY_MS);
            let status = self.bus.read_register(addr, registry::BMP280_STATUS_REG)?;
            if status & registry::BMP280_IM_UPDATE_STATUS == 0 {
                debug!("[BMP280] NVM prête après {} essai(s)", attempt);
                return Ok(());
            }
        }

        Err(Error::DeviceNotReady {
            attempts: registry::CALIBRATION_POLL_ATTEMPTS,
        })
    }

    /// Remplace la pression de référence au niveau de la mer (Pa) utilisée pour l'altitude
    pub fn set_sea_level_pressure(&mut self, sea_level_pa: f64) -> Result<()> {
        if !sea_level_pa.is_finite() || sea_level_pa <= 0.0 {
            return Err(Error::InvalidParameter(format!(
                "pression de référence {} Pa",
                sea_level_pa
            )));
        }

        match &mut self.state {
            Lifecycle::Ready(cal) => {
                cal.sea_level_pa = sea_level_pa;
                Ok(())
            }
            _ => Err(Error::InvalidState("capteur non initialisé")),
        }
    }

    /// Lecture et compensation d'un échantillon pression/température
    pub fn read(&mut self) -> Result<BarometerSample> {
        let cal = match &self.state {
            Lifecycle::Ready(cal) => *cal,
            _ => return Err(Error::InvalidState("lecture avant initialisation")),
        };

        let mut raw = [0u8; registry::BMP280_DATA_LEN];
        self.bus
            .read_block(self.device.address(), registry::BMP280_PRESSURE_MSB, &mut raw)?;

        let adc_p = compensation::decode_raw20([raw[0], raw[1], raw[2]]);
        let adc_t = compensation::decode_raw20([raw[3], raw[4], raw[5]]);

        let (t_fine, temperature) = compensation::compensate_temperature(adc_t, &cal);
        let pressure = compensation::compensate_pressure(adc_p, t_fine, &cal).map_err(|e| {
            debug!("[BMP280] Echantillon ignoré (brut P={:#x} T={:#x})", adc_p, adc_t);
            e
        })?;

        let pressure_pa = pressure as f64 / 256.0;

        Ok(BarometerSample {
            temperature,
            pressure: pressure_pa / 100.0,
            altitude: compensation::altitude(pressure_pa, cal.sea_level_pa),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::compensation::tests::DATASHEET_NVM;
    use super::registry::*;
    use super::*;
    use crate::i2c::HalBus;
    use embedded_hal::i2c::ErrorKind;
    use embedded_hal_mock::eh1::delay::{CheckedDelay, NoopDelay, Transaction as DelayTransaction};
    use embedded_hal_mock::eh1::i2c::{Mock as I2cMock, Transaction as I2cTransaction};

    const ADDR: u8 = BMP280_ADDR;

    // Pression et température brutes de l'exemple Bosch
    const DATASHEET_RAW: [u8; 6] = [0x65, 0x5A, 0xC0, 0x7E, 0xED, 0x00];

    fn init_until_status() -> Vec<I2cTransaction> {
        vec![
            I2cTransaction::write(ADDR, vec![BMP280_RESET_REG, BMP280_RESET_WORD]),
            I2cTransaction::write_read(ADDR, vec![BMP280_CHIP_ID_REG], vec![BMP280_CHIP_ID]),
            I2cTransaction::write(ADDR, vec![BMP280_CTRL_MEAS, 0x37]),
            I2cTransaction::write(ADDR, vec![BMP280_CONFIG, 0x00]),
        ]
    }

    fn expectations(nvm: [u8; 24], to_add: Vec<I2cTransaction>) -> Vec<I2cTransaction> {
        init_until_status()
            .into_iter()
            .chain([
                I2cTransaction::write_read(ADDR, vec![BMP280_STATUS_REG], vec![BMP280_IM_UPDATE_STATUS]),
                I2cTransaction::write_read(ADDR, vec![BMP280_STATUS_REG], vec![0x00]),
                I2cTransaction::write_read(ADDR, vec![BMP280_DIG_T1], nvm.to_vec()),
            ])
            .chain(to_add)
            .collect()
    }

    fn driver(i2c: &I2cMock) -> Bmp280<HalBus<I2cMock>, NoopDelay> {
        Bmp280::new(HalBus::new(i2c.clone()), NoopDelay::new(), BarometerConfig::default()).unwrap()
    }

    #[test]
    fn init_reaches_ready() {
        let mut i2c = I2cMock::new(&expectations(DATASHEET_NVM, vec![]));
        let mut baro = driver(&i2c);

        assert_eq!(*baro.state(), Lifecycle::Uninitialized);
        baro.init().unwrap();
        assert!(baro.state().is_ready());
        assert_eq!(baro.calibration().unwrap().dig_p9, 6000);

        i2c.done();
    }

    #[test]
    fn read_datasheet_sample() {
        let mut i2c = I2cMock::new(&expectations(
            DATASHEET_NVM,
            vec![I2cTransaction::write_read(ADDR, vec![BMP280_PRESSURE_MSB], DATASHEET_RAW.to_vec())],
        ));
        let mut baro = driver(&i2c);
        baro.init().unwrap();

        let sample = baro.read().unwrap();
        assert_eq!(sample.temperature, 25.08);
        assert_eq!(sample.pressure, 25767233.0 / 256.0 / 100.0);
        assert!((sample.altitude - 56.078).abs() < 0.01);

        i2c.done();
    }

    #[test]
    fn identity_mismatch_is_fatal() {
        let mut i2c = I2cMock::new(&[
            I2cTransaction::write(ADDR, vec![BMP280_RESET_REG, BMP280_RESET_WORD]),
            I2cTransaction::write_read(ADDR, vec![BMP280_CHIP_ID_REG], vec![0x60]),
        ]);
        let mut baro = driver(&i2c);

        let err = baro.init().unwrap_err();
        assert!(matches!(err, Error::IdentityMismatch { expected: 0x58, found: 0x60 }));
        assert!(err.is_fatal());
        assert_eq!(*baro.state(), Lifecycle::Failed(BaroStage::IdentityVerified));

        // Etat terminal: ni nouvel essai ni lecture
        assert!(matches!(baro.init(), Err(Error::InvalidState(_))));
        assert!(matches!(baro.read(), Err(Error::InvalidState(_))));

        i2c.done();
    }

    #[test]
    fn calibration_poll_gives_up_after_ten_attempts() {
        let mut transactions = init_until_status();
        for _ in 0..CALIBRATION_POLL_ATTEMPTS {
            transactions.push(I2cTransaction::write_read(
                ADDR,
                vec![BMP280_STATUS_REG],
                vec![BMP280_IM_UPDATE_STATUS],
            ));
        }
        let mut i2c = I2cMock::new(&transactions);
        let mut baro = driver(&i2c);

        assert!(matches!(baro.init(), Err(Error::DeviceNotReady { attempts: 10 })));
        assert_eq!(*baro.state(), Lifecycle::Failed(BaroStage::CalibrationReady));
        assert!(baro.calibration().is_none());
        assert!(matches!(baro.read(), Err(Error::InvalidState(_))));

        i2c.done();
    }

    #[test]
    fn waits_before_each_status_poll_then_settles() {
        let mut i2c = I2cMock::new(&expectations(DATASHEET_NVM, vec![]));
        // Deux lectures de statut (occupé puis prêt), puis stabilisation
        let mut delay = CheckedDelay::new(&[
            DelayTransaction::delay_ms(200),
            DelayTransaction::delay_ms(200),
            DelayTransaction::delay_ms(500),
        ]);
        let mut baro = Bmp280::new(HalBus::new(i2c.clone()), delay.clone(), BarometerConfig::default()).unwrap();

        baro.init().unwrap();
        assert!(baro.state().is_ready());

        i2c.done();
        delay.done();
    }

    #[test]
    fn exhausted_poll_waited_every_attempt() {
        let mut transactions = init_until_status();
        for _ in 0..CALIBRATION_POLL_ATTEMPTS {
            transactions.push(I2cTransaction::write_read(
                ADDR,
                vec![BMP280_STATUS_REG],
                vec![BMP280_IM_UPDATE_STATUS],
            ));
        }
        let mut i2c = I2cMock::new(&transactions);
        let mut delay = CheckedDelay::new(&vec![DelayTransaction::delay_ms(200); 10]);
        let mut baro = Bmp280::new(HalBus::new(i2c.clone()), delay.clone(), BarometerConfig::default()).unwrap();

        assert!(matches!(baro.init(), Err(Error::DeviceNotReady { attempts: 10 })));

        i2c.done();
        delay.done();
    }

    #[test]
    fn read_before_init_touches_nothing() {
        let mut i2c = I2cMock::new(&[]);
        let mut baro = driver(&i2c);

        assert!(matches!(baro.read(), Err(Error::InvalidState(_))));
        assert!(matches!(baro.set_sea_level_pressure(101000.0), Err(Error::InvalidState(_))));

        i2c.done();
    }

    #[test]
    fn transport_fault_during_init() {
        let mut i2c = I2cMock::new(&[I2cTransaction::write(
            ADDR,
            vec![BMP280_RESET_REG, BMP280_RESET_WORD],
        )
        .with_error(ErrorKind::Other)]);
        let mut baro = driver(&i2c);

        assert!(matches!(baro.init(), Err(Error::TransportFault { address: ADDR, .. })));
        assert_eq!(*baro.state(), Lifecycle::Failed(BaroStage::Reset));

        i2c.done();
    }

    #[test]
    fn singularity_is_recoverable() {
        // dig_P1 = 0 annule le dénominateur
        let mut nvm = DATASHEET_NVM;
        nvm[6] = 0;
        nvm[7] = 0;

        let mut i2c = I2cMock::new(&expectations(
            nvm,
            vec![
                I2cTransaction::write_read(ADDR, vec![BMP280_PRESSURE_MSB], DATASHEET_RAW.to_vec()),
                I2cTransaction::write_read(ADDR, vec![BMP280_PRESSURE_MSB], DATASHEET_RAW.to_vec()),
            ],
        ));
        let mut baro = driver(&i2c);
        baro.init().unwrap();

        let err = baro.read().unwrap_err();
        assert!(matches!(err, Error::ComputationSingularity));
        assert!(!err.is_fatal());
        assert!(baro.state().is_ready());
        assert!(matches!(baro.read(), Err(Error::ComputationSingularity)));

        i2c.done();
    }

    #[test]
    fn sea_level_override() {
        let mut i2c = I2cMock::new(&expectations(
            DATASHEET_NVM,
            vec![I2cTransaction::write_read(ADDR, vec![BMP280_PRESSURE_MSB], DATASHEET_RAW.to_vec())],
        ));
        let mut baro = driver(&i2c);
        baro.init().unwrap();

        assert!(matches!(baro.set_sea_level_pressure(0.0), Err(Error::InvalidParameter(_))));
        assert!(matches!(baro.set_sea_level_pressure(f64::NAN), Err(Error::InvalidParameter(_))));
        assert_eq!(baro.calibration().unwrap().sea_level_pa, DEFAULT_SEA_LEVEL_PA);

        baro.set_sea_level_pressure(25767233.0 / 256.0).unwrap();
        let sample = baro.read().unwrap();
        assert_eq!(sample.altitude, 0.0);

        i2c.done();
    }

    #[test]
    fn rejects_8bit_address() {
        let mut i2c = I2cMock::new(&[]);
        let config = BarometerConfig {
            address: 0xEC,
            ..BarometerConfig::default()
        };
        assert!(matches!(
            Bmp280::new(HalBus::new(i2c.clone()), NoopDelay::new(), config),
            Err(Error::InvalidParameter(_))
        ));
        i2c.done();
    }
}
