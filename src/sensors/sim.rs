//! Bus simulé: BMP280, MPU9250 et AK8963 répondent au niveau registre,
//! les mesures sont bruitées autour d'une valeur au repos.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::error::{Error, Result};
use crate::i2c::RegisterBus;
use crate::sensors::baro::registry as baro;
use crate::sensors::imu::registry as imu;

// Bloc NVM d'un BMP280 réel
const BMP280_NVM: [u8; 24] = [
    112, 107, 67, 103, 24, 252, 125, 142, 67, 214, 208, 11, 39, 11, 140, 0, 249, 255, 140, 60, 248,
    198, 112, 23,
];

const ADC_P_REST: i32 = 415148;
const ADC_T_REST: i32 = 519888;

pub struct SimulatedBus {
    rng: StdRng,
}

impl SimulatedBus {
    pub fn new() -> Self {
        SimulatedBus {
            rng: StdRng::from_entropy(),
        }
    }

    pub fn with_seed(seed: u64) -> Self {
        SimulatedBus {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    fn raw20(&mut self, rest: i32, noise: i32) -> [u8; 3] {
        let value = (rest + self.rng.gen_range(-noise..=noise)).clamp(0, 0xFFFFF);
        [(value >> 12) as u8, (value >> 4) as u8, ((value & 0x0F) << 4) as u8]
    }

    fn axes(&mut self, rest: [i16; 3], noise: i16, big_endian: bool) -> [u8; 6] {
        let mut out = [0u8; 6];
        for (i, axis) in rest.iter().enumerate() {
            let value = axis.saturating_add(self.rng.gen_range(-noise..=noise));
            let bytes = if big_endian {
                value.to_be_bytes()
            } else {
                value.to_le_bytes()
            };
            out[2 * i..2 * i + 2].copy_from_slice(&bytes);
        }
        out
    }

    fn block(&mut self, address: u8, register: u8) -> Result<Vec<u8>> {
        let data = match (address, register) {
            (baro::BMP280_ADDR, baro::BMP280_CHIP_ID_REG) => vec![baro::BMP280_CHIP_ID],
            (baro::BMP280_ADDR, baro::BMP280_STATUS_REG) => vec![0x00],
            (baro::BMP280_ADDR, baro::BMP280_DIG_T1) => BMP280_NVM.to_vec(),
            (baro::BMP280_ADDR, baro::BMP280_PRESSURE_MSB) => {
                let mut data = self.raw20(ADC_P_REST, 400).to_vec();
                data.extend(self.raw20(ADC_T_REST, 100));
                data
            }

            (imu::MPU9250_ADDR, imu::MPU9250_IDENTITY_REG) => vec![imu::MPU9250_IDENTITY],
            // Au repos, 1 g sur Z à ±8 g
            (imu::MPU9250_ADDR, imu::MPU9250_ACCEL_XOUT_H) => self.axes([0, 0, 4096], 40, true).to_vec(),
            (imu::MPU9250_ADDR, imu::MPU9250_GYRO_XOUT_H) => self.axes([0, 0, 0], 8, true).to_vec(),

            (imu::AK8963_ADDR, imu::AK8963_WIA) => vec![imu::AK8963_WHO_AM_I],
            (imu::AK8963_ADDR, imu::AK8963_ASAX) => vec![128, 128, 128],
            (imu::AK8963_ADDR, imu::AK8963_HXL) => self.axes([150, -80, 260], 6, false).to_vec(),
            (imu::AK8963_ADDR, imu::AK8963_ST2) => vec![0x10],

            _ => {
                return Err(Error::TransportFault {
                    address,
                    register,
                    cause: "registre non simulé".to_string(),
                })
            }
        };

        Ok(data)
    }
}

impl Default for SimulatedBus {
    fn default() -> Self {
        Self::new()
    }
}

impl RegisterBus for SimulatedBus {
    fn write_register(&mut self, address: u8, register: u8, _value: u8) -> Result<()> {
        match address {
            baro::BMP280_ADDR | imu::MPU9250_ADDR | imu::AK8963_ADDR => Ok(()),
            _ => Err(Error::TransportFault {
                address,
                register,
                cause: "aucun composant à cette adresse".to_string(),
            }),
        }
    }

    fn read_register(&mut self, address: u8, register: u8) -> Result<u8> {
        let mut buffer = [0u8; 1];
        self.read_block(address, register, &mut buffer)?;
        Ok(buffer[0])
    }

    fn read_block(&mut self, address: u8, register: u8, buffer: &mut [u8]) -> Result<()> {
        let data = self.block(address, register)?;
        for (i, byte) in buffer.iter_mut().enumerate() {
            *byte = data.get(i).copied().unwrap_or(0);
        }
        Ok(())
    }
}
