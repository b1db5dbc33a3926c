//! Conversions de la centrale inertielle, sans entrée/sortie.

use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

use super::registry;
use crate::error::{Error, Result};
use crate::sensors::Triplet;

/// Trois entiers signés 16 bits, octet de poids fort en premier (accéléromètre, gyroscope)
pub fn decode_be_axes(raw: &[u8; 6]) -> [i16; 3] {
    [
        i16::from_be_bytes([raw[0], raw[1]]),
        i16::from_be_bytes([raw[2], raw[3]]),
        i16::from_be_bytes([raw[4], raw[5]]),
    ]
}

/// Trois entiers signés 16 bits, octet de poids faible en premier (magnétomètre)
pub fn decode_le_axes(raw: &[u8; 6]) -> [i16; 3] {
    [
        i16::from_le_bytes([raw[0], raw[1]]),
        i16::from_le_bytes([raw[2], raw[3]]),
        i16::from_le_bytes([raw[4], raw[5]]),
    ]
}

pub fn round4(value: f64) -> f64 {
    (value * 1e4).round() / 1e4
}

/// Applique un facteur d'échelle aux trois axes, arrondi à 4 décimales
pub fn scale_axes(raw: [i16; 3], scale: f64) -> Triplet {
    Triplet::new(
        round4(raw[0] as f64 * scale),
        round4(raw[1] as f64 * scale),
        round4(raw[2] as f64 * scale),
    )
}

/// Diviseur SMPLRT_DIV pour une fréquence demandée en Hz (4 à 1000)
pub fn sample_rate_divider(rate_hz: u16) -> Result<u8> {
    if !(registry::SAMPLE_RATE_MIN_HZ..=registry::SAMPLE_RATE_MAX_HZ).contains(&rate_hz) {
        return Err(Error::InvalidParameter(format!(
            "fréquence {} Hz hors plage ({}-{} Hz)",
            rate_hz,
            registry::SAMPLE_RATE_MIN_HZ,
            registry::SAMPLE_RATE_MAX_HZ
        )));
    }

    let ratio = (registry::INTERNAL_RATE_HZ / rate_hz as f64).round_ties_even();
    Ok(ratio as u8 - 1)
}

/// Multiplicateur d'usine d'un axe du magnétomètre
pub fn sensitivity_adjustment(asa: u8) -> f64 {
    (asa as f64 - 128.0) / 256.0 + 1.0
}

/// Ajustement de sensibilité lu dans la fuse ROM de l'AK8963
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct MagAdjustment {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl MagAdjustment {
    pub fn from_fuse_rom(asa: [u8; 3]) -> Self {
        MagAdjustment {
            x: sensitivity_adjustment(asa[0]),
            y: sensitivity_adjustment(asa[1]),
            z: sensitivity_adjustment(asa[2]),
        }
    }
}

impl Default for MagAdjustment {
    fn default() -> Self {
        MagAdjustment { x: 1.0, y: 1.0, z: 1.0 }
    }
}

/// Champ magnétique en µT dans le repère de l'accéléromètre.
/// Les axes X/Y du magnétomètre sont inversés et son Z opposé.
pub fn remap_magnetometer(raw: [i16; 3], adjustment: &MagAdjustment) -> Triplet {
    let swapped = Vector3::new(raw[1] as f64, raw[0] as f64, -(raw[2] as f64));
    let factors = Vector3::new(adjustment.y, adjustment.x, adjustment.z);
    let field = swapped.component_mul(&factors) * registry::MAG_RAW_TO_UT;

    Triplet::new(field.x, field.y, field.z)
}
