use embedded_hal::delay::DelayNs;
use futures::Stream;
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::pin::Pin;
use std::sync::{Arc, Mutex, PoisonError};
use std::task::Poll;
use std::thread;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};
use tokio_util::sync::CancellationToken;

use crate::error::Result;
use crate::i2c::RegisterBus;
use crate::sensors::baro::{BarometerSample, Bmp280};
use crate::sensors::imu::Mpu9250;
use crate::sensors::Triplet;

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ImuData {
    /// m/s²
    pub acceleration: Triplet,
    /// °/s
    pub angular_rate: Triplet,
    /// µT, absent en variante 6 axes
    pub magnetic_field: Option<Triplet>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SensorsData {
    pub imu: ImuData,
    pub baro: Option<BarometerSample>,
    /// Nombre de cycles d'acquisition effectués
    pub sequence: u64,
    /// ms depuis l'epoch
    pub time: u64,
}

/// Suivi des erreurs de lecture d'une source.
/// Seules les transitions sont signalées: premier échec puis retour à la normale.
#[derive(Debug)]
struct ReadHealth {
    tag: &'static str,
    failing: bool,
}

impl ReadHealth {
    fn new(tag: &'static str) -> Self {
        ReadHealth { tag, failing: false }
    }

    fn check<T>(&mut self, result: Result<T>) -> Option<T> {
        match result {
            Ok(value) => {
                if self.failing {
                    info!("{} Lectures rétablies", self.tag);
                    self.failing = false;
                }
                Some(value)
            }
            Err(e) => {
                if self.failing {
                    debug!("{} Erreur de lecture: {}", self.tag, e);
                } else {
                    warn!("{} Erreur de lecture: {} (suivantes masquées)", self.tag, e);
                    self.failing = true;
                }
                None
            }
        }
    }
}

/// Acquisition périodique dans un thread dédié.
/// Le flux rend toujours le dernier échantillon complet.
pub struct Reader {
    data: Arc<Mutex<SensorsData>>,
    token: CancellationToken,
}

impl Reader {
    /// Les pilotes doivent déjà être initialisés
    pub fn new<B, D>(
        mut imu: Mpu9250<B, D>,
        mut baro: Option<Bmp280<B, D>>,
        rate_hz: u16,
        token: CancellationToken,
    ) -> Self
    where
        B: RegisterBus + Send + 'static,
        D: DelayNs + Send + 'static,
    {
        let data: Arc<Mutex<SensorsData>> = Arc::new(Mutex::new(SensorsData::default()));
        let data_thread = data.clone();
        let thread_token = token.clone();
        let reader = Reader { data, token };

        let period = Duration::from_secs_f64(1.0 / rate_hz.max(1) as f64);

        info!("[CAPTEURS] Démarrage du thread ({} Hz) ...", rate_hz);
        thread::spawn(move || {
            let mut current_data = SensorsData::default();
            let mut accel_health = ReadHealth::new("[MPU9250] Accéléromètre:");
            let mut gyro_health = ReadHealth::new("[MPU9250] Gyroscope:");
            let mut mag_health = ReadHealth::new("[AK8963]");
            let mut baro_health = ReadHealth::new("[BMP280]");

            while !thread_token.is_cancelled() {
                let started = Instant::now();

                // Capteur: IMU
                if let Some(acceleration) = accel_health.check(imu.read_acceleration()) {
                    current_data.imu.acceleration = acceleration;
                }

                if let Some(angular_rate) = gyro_health.check(imu.read_angular_rate()) {
                    current_data.imu.angular_rate = angular_rate;
                }

                if imu.config().magnetometer {
                    if let Some(field) = mag_health.check(imu.read_magnetic_field()) {
                        current_data.imu.magnetic_field = Some(field);
                    }
                }

                // Capteur: Pression (l'échantillon précédent est gardé en cas d'erreur)
                if let Some(baro) = baro.as_mut() {
                    if let Some(sample) = baro_health.check(baro.read()) {
                        current_data.baro = Some(sample);
                    }
                }

                current_data.sequence += 1;
                current_data.time = SystemTime::now()
                    .duration_since(UNIX_EPOCH)
                    .map(|d| d.as_millis() as u64)
                    .unwrap_or(0);

                *data_thread.lock().unwrap_or_else(PoisonError::into_inner) = current_data.clone();

                if let Some(rest) = period.checked_sub(started.elapsed()) {
                    thread::sleep(rest);
                }
            }

            info!("[CAPTEURS] Fin du thread.");
        });

        reader
    }

    pub fn latest(&self) -> SensorsData {
        self.data
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl Stream for Reader {
    type Item = SensorsData;

    fn poll_next(
        self: Pin<&mut Self>,
        _cx: &mut std::task::Context<'_>,
    ) -> Poll<Option<Self::Item>> {
        if self.token.is_cancelled() {
            return Poll::Ready(None);
        }

        Poll::Ready(Some(self.latest()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::sensors::baro::compensation::tests::DATASHEET_NVM;
    use crate::sensors::baro::BarometerConfig;
    use crate::sensors::imu::ImuConfig;
    use embedded_hal_mock::eh1::delay::NoopDelay;
    use futures::executor::block_on;
    use futures::StreamExt;

    /// Composants toujours au repos, réponses fixes
    struct RestingBus;

    impl RegisterBus for RestingBus {
        fn write_register(&mut self, _address: u8, _register: u8, _value: u8) -> Result<()> {
            Ok(())
        }

        fn read_register(&mut self, address: u8, register: u8) -> Result<u8> {
            let mut buffer = [0u8; 1];
            self.read_block(address, register, &mut buffer)?;
            Ok(buffer[0])
        }

        fn read_block(&mut self, address: u8, register: u8, buffer: &mut [u8]) -> Result<()> {
            let data: &[u8] = match (address, register) {
                (0x76, 0xD0) => &[0x58],
                (0x76, 0x88) => &DATASHEET_NVM,
                (0x76, 0xF7) => &[0x65, 0x5A, 0xC0, 0x7E, 0xED, 0x00],
                (0x68, 0x00) => &[0x71],
                (0x68, 0x3B) => &[0x00, 0x00, 0x00, 0x00, 0x08, 0x00],
                _ => &[],
            };
            for (i, byte) in buffer.iter_mut().enumerate() {
                *byte = data.get(i).copied().unwrap_or(0);
            }
            Ok(())
        }
    }

    #[test]
    fn stream_yields_latest_sample_until_cancelled() {
        let config = ImuConfig {
            magnetometer: false,
            ..ImuConfig::default()
        };
        let mut imu = Mpu9250::new(RestingBus, NoopDelay::new(), config).unwrap();
        imu.init().unwrap();
        let mut baro = Bmp280::new(RestingBus, NoopDelay::new(), BarometerConfig::default()).unwrap();
        baro.init().unwrap();

        let token = CancellationToken::new();
        let mut reader = Reader::new(imu, Some(baro), 200, token.clone());

        let mut data = block_on(reader.next()).unwrap();
        while data.sequence == 0 {
            thread::sleep(Duration::from_millis(5));
            data = block_on(reader.next()).unwrap();
        }

        assert_eq!(data.imu.acceleration, Triplet::new(0.0, 0.0, 4.9033));
        assert_eq!(data.imu.magnetic_field, None);
        assert_eq!(data.baro.map(|b| b.temperature), Some(25.08));

        token.cancel();
        assert_eq!(block_on(reader.next()), None);
    }

    #[test]
    fn read_faults_are_reported_on_transitions() {
        let mut health = ReadHealth::new("[BMP280]");

        assert_eq!(health.check(Ok(1)), Some(1));
        assert!(!health.failing);

        assert_eq!(health.check::<u8>(Err(Error::ComputationSingularity)), None);
        assert!(health.failing);
        assert_eq!(health.check::<u8>(Err(Error::ComputationSingularity)), None);
        assert!(health.failing);

        assert_eq!(health.check(Ok(2)), Some(2));
        assert!(!health.failing);
    }
}
