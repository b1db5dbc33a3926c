#![allow(unused)]

// MPU9250
pub const MPU9250_ADDR: u8 = 0x68;
pub const MPU9250_ADDR_ALT: u8 = 0x69;

// Registre lu pour l'identification
pub const MPU9250_IDENTITY_REG: u8 = 0x00;
pub const MPU9250_IDENTITY: u8 = 0x71;

pub const MPU9250_SMPLRT_DIV: u8 = 0x19;
pub const MPU9250_CONFIG: u8 = 0x1A;
pub const MPU9250_GYRO_CONFIG: u8 = 0x1B;
pub const MPU9250_ACCEL_CONFIG: u8 = 0x1C;
pub const MPU9250_ACCEL_CONFIG_2: u8 = 0x1D;
pub const MPU9250_INT_PIN_CFG: u8 = 0x37;
pub const MPU9250_ACCEL_XOUT_H: u8 = 0x3B;
pub const MPU9250_GYRO_XOUT_H: u8 = 0x43;
pub const MPU9250_USER_CTRL: u8 = 0x6A;
pub const MPU9250_PWR_MGMT_1: u8 = 0x6B;

pub const MPU9250_H_RESET: u8 = 0x80;
pub const MPU9250_BYPASS_EN: u8 = 0x02;
pub const MPU9250_USER_CTRL_DEFAULT: u8 = 0x00;

// ACCEL_CONFIG: ACCEL_FS_SEL[4:3]
pub const ACCEL_FSR_CFG_2G: u8 = 0x00;
pub const ACCEL_FSR_CFG_4G: u8 = 0x08;
pub const ACCEL_FSR_CFG_8G: u8 = 0x10;
pub const ACCEL_FSR_CFG_16G: u8 = 0x18;

// GYRO_CONFIG: GYRO_FS_SEL[4:3] FCHOICE_B[1:0]
pub const GYRO_FSR_CFG_250: u8 = 0x00;
pub const GYRO_FSR_CFG_500: u8 = 0x08;
pub const GYRO_FSR_CFG_1000: u8 = 0x10;
pub const GYRO_FSR_CFG_2000: u8 = 0x18;
pub const FCHOICE_B_DLPF_EN: u8 = 0x00;

// ACCEL_CONFIG_2: ACCEL_FCHOICE_B[3] A_DLPF_CFG[2:0]
pub const ACCEL_FCHOICE_1KHZ: u8 = 0x00;
pub const ACCEL_FCHOICE_4KHZ: u8 = 0x08;
pub const BIT_FIFO_SIZE_1024: u8 = 0x40;

// CONFIG: FIFO_MODE[6] DLPF_CFG[2:0]
pub const FIFO_MODE_REPLACE_OLD: u8 = 0x00;

pub const MPU9250_DATA_LEN: usize = 6;

// Plage de fréquence d'échantillonnage acceptée (Hz), horloge interne 1 kHz
pub const SAMPLE_RATE_MIN_HZ: u16 = 4;
pub const SAMPLE_RATE_MAX_HZ: u16 = 1000;
pub const INTERNAL_RATE_HZ: f64 = 1000.0;

pub const GRAVITY: f64 = 9.80665;
pub const RAW_FULL_SCALE: f64 = 32768.0;

pub const RESET_DELAY_MS: u32 = 100;
pub const CONFIG_SETTLE_MS: u32 = 100;

// AK8963
pub const AK8963_ADDR: u8 = 0x0C;

pub const AK8963_WIA: u8 = 0x00;
pub const AK8963_HXL: u8 = 0x03;
pub const AK8963_ST2: u8 = 0x09;
pub const AK8963_CNTL1: u8 = 0x0A;
pub const AK8963_ASAX: u8 = 0x10;

pub const AK8963_WHO_AM_I: u8 = 0x48;

pub const AK8963_POWER_DOWN: u8 = 0x00;
pub const AK8963_FUSE_ROM: u8 = 0x0F;
pub const AK8963_CONT_16BIT_100HZ: u8 = 0x16;

pub const AK8963_HOFL: u8 = 0x08;

pub const AK8963_DATA_LEN: usize = 6;
pub const AK8963_ASA_LEN: usize = 3;
pub const AK8963_MODE_DELAY_MS: u32 = 10;

// Sensibilité en 16 bits: 4912 µT pour 32760 LSB
pub const MAG_RAW_TO_UT: f64 = 4912.0 / 32760.0;
