mod cli;

use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use futures::StreamExt;
use log::info;
use tokio::signal;
use tokio_util::sync::CancellationToken;

#[cfg(unix)]
use tokio::signal::unix::SignalKind;

use beaglesensors::config::Config;
use beaglesensors::delay::SleepDelay;
use beaglesensors::i2c::SharedBus;
use beaglesensors::sensors::baro::Bmp280;
use beaglesensors::sensors::imu::Mpu9250;
use beaglesensors::sensors::reader::{Reader, SensorsData};

#[cfg(not(any(feature = "real-sensors", feature = "fake-sensors")))]
compile_error!("activer la feature \"real-sensors\" ou \"fake-sensors\"");

#[cfg(feature = "real-sensors")]
type Bus = rppal::i2c::I2c;

#[cfg(all(feature = "fake-sensors", not(feature = "real-sensors")))]
type Bus = beaglesensors::sensors::sim::SimulatedBus;

#[cfg(feature = "real-sensors")]
fn open_bus(bus: u8) -> anyhow::Result<Bus> {
    rppal::i2c::I2c::with_bus(bus).with_context(|| format!("[I2C] Erreur de bus /dev/i2c-{}", bus))
}

#[cfg(all(feature = "fake-sensors", not(feature = "real-sensors")))]
fn open_bus(bus: u8) -> anyhow::Result<Bus> {
    info!("[I2C] Bus {} simulé [FAKE]", bus);
    Ok(Bus::new())
}

/// Initialise les capteurs puis démarre le thread d'acquisition
fn start(config: Config, token: CancellationToken) -> anyhow::Result<Reader> {
    let imu_bus = SharedBus::new(open_bus(config.imu.bus)?);

    let mut imu = Mpu9250::new(imu_bus.clone(), SleepDelay, config.imu)?;
    imu.init().context("[MPU9250] Capteur non disponible")?;

    let baro = match config.barometer {
        Some(baro_config) => {
            // BMP280 et MPU9250 partagent normalement le même bus
            let bus = if baro_config.bus == config.imu.bus {
                imu_bus.clone()
            } else {
                SharedBus::new(open_bus(baro_config.bus)?)
            };

            let mut baro = Bmp280::new(bus, SleepDelay, baro_config)?;
            baro.init().context("[BMP280] Capteur non disponible")?;
            baro.set_sea_level_pressure(config.sea_level_pa)?;
            Some(baro)
        }
        None => None,
    };

    Ok(Reader::new(imu, baro, config.rate_hz, token))
}

fn log_sample(data: &SensorsData) {
    info!(
        "[MPU9250] A: ({}) m/s² G: ({}) °/s",
        data.imu.acceleration, data.imu.angular_rate
    );

    if let Some(field) = data.imu.magnetic_field {
        info!("[AK8963] M: ({}) µT", field);
    }

    if let Some(baro) = data.baro {
        info!("[BMP280] {}", baro);
    }
}

async fn shutdown_signal() -> anyhow::Result<()> {
    #[cfg(unix)]
    {
        let mut terminate = signal::unix::signal(SignalKind::terminate())?;
        tokio::select! {
            _ = terminate.recv() => info!("Signal de terminaison reçu"),
            result = signal::ctrl_c() => {
                result?;
                info!("Signal de contrôle C reçu");
            },
        }
    }

    #[cfg(not(unix))]
    {
        signal::ctrl_c().await?;
        info!("Signal de contrôle C reçu");
    }

    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = cli::Cli::parse().into_config()?;
    info!("[CONFIG] {:?}", config);

    let token = CancellationToken::new();

    // Les séquences d'initialisation sont bloquantes (resets, attente de la NVM)
    let thread_token = token.child_token();
    let mut reader = tokio::task::spawn_blocking(move || start(config, thread_token)).await??;

    let mut ticker = tokio::time::interval(Duration::from_secs_f64(1.0 / config.rate_hz as f64));
    let shutdown = shutdown_signal();
    tokio::pin!(shutdown);

    let mut last_sequence = 0;
    loop {
        tokio::select! {
            result = &mut shutdown => {
                token.cancel();
                result?;
                break;
            }
            _ = ticker.tick() => {
                match reader.next().await {
                    Some(data) if data.sequence != last_sequence => {
                        last_sequence = data.sequence;
                        log_sample(&data);
                    }
                    Some(_) => {}
                    None => break,
                }
            }
        }
    }

    info!("[CAPTEURS] Arrêt.");
    Ok(())
}
