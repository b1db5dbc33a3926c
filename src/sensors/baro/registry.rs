#![allow(unused)]

// BMP280
pub const BMP280_ADDR: u8 = 0x76;
pub const BMP280_ADDR_ALT: u8 = 0x77;

pub const BMP280_DIG_T1: u8 = 0x88;
pub const BMP280_CHIP_ID_REG: u8 = 0xD0;
pub const BMP280_RESET_REG: u8 = 0xE0;
pub const BMP280_STATUS_REG: u8 = 0xF3;
pub const BMP280_CTRL_MEAS: u8 = 0xF4;
pub const BMP280_CONFIG: u8 = 0xF5;
pub const BMP280_PRESSURE_MSB: u8 = 0xF7;
pub const BMP280_TEMP_MSB: u8 = 0xFA;

pub const BMP280_CHIP_ID: u8 = 0x58;
pub const BMP280_RESET_WORD: u8 = 0xB6;

pub const BMP280_IM_UPDATE_STATUS: u8 = 0x01;
pub const BMP280_MEASURING_STATUS: u8 = 0x08;

// CTRL_MEAS: osrs_t[7:5] osrs_p[4:2] mode[1:0]
pub const BMP_MODE_NORMAL: u8 = 0x03;
pub const BMP_TEMP_OVERSAMPLE_1: u8 = 0x01 << 5;
pub const BMP_OVERSAMPLE_1: u8 = 0x01 << 2;
pub const BMP_OVERSAMPLE_2: u8 = 0x02 << 2;
pub const BMP_OVERSAMPLE_4: u8 = 0x03 << 2;
pub const BMP_OVERSAMPLE_8: u8 = 0x04 << 2;
pub const BMP_OVERSAMPLE_16: u8 = 0x05 << 2;

// CONFIG: t_sb[7:5] filter[4:2]
pub const BMP280_TSB_0: u8 = 0x00;
pub const BMP_FILTER_OFF: u8 = 0x00;
pub const BMP_FILTER_2: u8 = 0x01 << 2;
pub const BMP_FILTER_4: u8 = 0x02 << 2;
pub const BMP_FILTER_8: u8 = 0x03 << 2;
pub const BMP_FILTER_16: u8 = 0x04 << 2;

pub const BMP280_CALIBRATION_LEN: usize = 24;
pub const BMP280_DATA_LEN: usize = 6;

pub const DEFAULT_SEA_LEVEL_PA: f64 = 101325.0;

// Scrutation du bit "im_update" avant lecture de la NVM
pub const CALIBRATION_POLL_ATTEMPTS: u8 = 10;
pub const CALIBRATION_POLL_DELAY_MS: u32 = 200;
pub const CALIBRATION_SETTLE_MS: u32 = 500;
