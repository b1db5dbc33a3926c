//! Pilotes I2C du capteur de pression BMP280 et de la centrale inertielle
//! MPU9250 (avec son magnétomètre AK8963), tels que câblés sur une BeagleBone Blue.

pub mod config;
pub mod delay;
pub mod error;
pub mod i2c;
pub mod sensors;

pub use error::{Error, Result};
