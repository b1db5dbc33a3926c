//! Formules de compensation du BMP280 (datasheet Bosch, §3.11.3 et §8.2).
//!
//! Aucune entrée/sortie ici: l'ordre des multiplications et des décalages est
//! celui du constructeur, les troncatures intermédiaires font partie du résultat.

use serde::{Deserialize, Serialize};

use super::registry;
use crate::error::{Error, Result};

/// Constantes d'usine lues dans la NVM, plus la pression de référence au niveau de la mer
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Calibration {
    pub dig_t1: u16,
    pub dig_t2: i16,
    pub dig_t3: i16,
    pub dig_p1: u16,
    pub dig_p2: i16,
    pub dig_p3: i16,
    pub dig_p4: i16,
    pub dig_p5: i16,
    pub dig_p6: i16,
    pub dig_p7: i16,
    pub dig_p8: i16,
    pub dig_p9: i16,
    pub sea_level_pa: f64,
}

impl Calibration {
    /// Décode le bloc NVM de 24 octets (paires little-endian, rôles fixes)
    pub fn from_nvm(b: &[u8; registry::BMP280_CALIBRATION_LEN]) -> Self {
        Calibration {
            dig_t1: u16::from_le_bytes([b[0], b[1]]),
            dig_t2: i16::from_le_bytes([b[2], b[3]]),
            dig_t3: i16::from_le_bytes([b[4], b[5]]),
            dig_p1: u16::from_le_bytes([b[6], b[7]]),
            dig_p2: i16::from_le_bytes([b[8], b[9]]),
            dig_p3: i16::from_le_bytes([b[10], b[11]]),
            dig_p4: i16::from_le_bytes([b[12], b[13]]),
            dig_p5: i16::from_le_bytes([b[14], b[15]]),
            dig_p6: i16::from_le_bytes([b[16], b[17]]),
            dig_p7: i16::from_le_bytes([b[18], b[19]]),
            dig_p8: i16::from_le_bytes([b[20], b[21]]),
            dig_p9: i16::from_le_bytes([b[22], b[23]]),
            sea_level_pa: registry::DEFAULT_SEA_LEVEL_PA,
        }
    }
}

/// Valeur brute 20 bits: MSB, LSB et les 4 bits hauts de XLSB
pub fn decode_raw20(bytes: [u8; 3]) -> i32 {
    ((bytes[0] as i32) << 12) | ((bytes[1] as i32) << 4) | ((bytes[2] as i32) >> 4)
}

/// Compensation de la température.
/// Retourne (t_fine, température en °C).
///
/// Calcul en 64 bits: identique à la version 32 bits du constructeur tant
/// qu'elle ne déborde pas, et sans débordement pour une lecture saturée.
pub fn compensate_temperature(adc_t: i32, cal: &Calibration) -> (i32, f64) {
    let adc_t = adc_t as i64;
    let t1 = cal.dig_t1 as i64;
    let t2 = cal.dig_t2 as i64;
    let t3 = cal.dig_t3 as i64;

    let var1 = (((adc_t >> 3) - (t1 << 1)) * t2) >> 11;
    let var2 = (((((adc_t >> 4) - t1) * ((adc_t >> 4) - t1)) >> 12) * t3) >> 14;

    let t_fine = (var1 + var2).clamp(i32::MIN as i64, i32::MAX as i64);
    let t = (t_fine * 5 + 128) >> 8;

    (t_fine as i32, t as f64 / 100.0)
}

/// Compensation de la pression.
/// Retourne la pression en Pa au format Q24.8 (diviser par 256).
///
/// Même séquence que la version 64 bits du constructeur, évaluée en 128 bits
/// pour couvrir toutes les valeurs brutes 20 bits et tous les coefficients i16.
pub fn compensate_pressure(adc_p: i32, t_fine: i32, cal: &Calibration) -> Result<u32> {
    let mut var1 = t_fine as i128 - 128000;
    let mut var2 = var1 * var1 * cal.dig_p6 as i128;
    var2 += (var1 * cal.dig_p5 as i128) << 17;
    var2 += (cal.dig_p4 as i128) << 35;
    var1 = ((var1 * var1 * cal.dig_p3 as i128) >> 8) + ((var1 * cal.dig_p2 as i128) << 12);
    var1 = (((1i128 << 47) + var1) * cal.dig_p1 as i128) >> 33;

    // Evite la division par zéro (capteur non calibré ou lecture corrompue)
    if var1 == 0 {
        return Err(Error::ComputationSingularity);
    }

    let mut p: i128 = 1048576 - adc_p as i128;
    p = (((p << 31) - var2) * 3125) / var1;
    // Quotient hors 64 bits: dénominateur quasi nul
    if i64::try_from(p).is_err() {
        return Err(Error::ComputationSingularity);
    }
    var1 = (cal.dig_p9 as i128 * (p >> 13) * (p >> 13)) >> 25;
    var2 = (cal.dig_p8 as i128 * p) >> 19;
    p = ((p + var1 + var2) >> 8) + ((cal.dig_p7 as i128) << 4);

    // Pression négative ou hors format Q24.8: lecture incohérente
    u32::try_from(p).map_err(|_| Error::ComputationSingularity)
}

/// Formule barométrique internationale
pub fn altitude(pressure_pa: f64, sea_level_pa: f64) -> f64 {
    44330.0 * (1.0 - (pressure_pa / sea_level_pa).powf(0.1903))
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// Bloc NVM de l'exemple de la datasheet Bosch
    pub(crate) const DATASHEET_NVM: [u8; 24] = [
        112, 107, 67, 103, 24, 252, 125, 142, 67, 214, 208, 11, 39, 11, 140, 0, 249, 255, 140, 60,
        248, 198, 112, 23,
    ];
    pub(crate) const DATASHEET_ADC_T: i32 = 519888;
    pub(crate) const DATASHEET_ADC_P: i32 = 415148;

    #[test]
    fn nvm_block_decoding() {
        let cal = Calibration::from_nvm(&DATASHEET_NVM);
        assert_eq!(cal.dig_t1, 27504);
        assert_eq!(cal.dig_t2, 26435);
        assert_eq!(cal.dig_t3, -1000);
        assert_eq!(cal.dig_p1, 36477);
        assert_eq!(cal.dig_p2, -10685);
        assert_eq!(cal.dig_p3, 3024);
        assert_eq!(cal.dig_p4, 2855);
        assert_eq!(cal.dig_p5, 140);
        assert_eq!(cal.dig_p6, -7);
        assert_eq!(cal.dig_p7, 15500);
        assert_eq!(cal.dig_p8, -14600);
        assert_eq!(cal.dig_p9, 6000);
        assert_eq!(cal.sea_level_pa, 101325.0);
    }

    #[test]
    fn raw20_uses_upper_nibble_of_xlsb() {
        assert_eq!(decode_raw20([0x65, 0x5A, 0xC0]), DATASHEET_ADC_P);
        assert_eq!(decode_raw20([0x7E, 0xED, 0x0F]), DATASHEET_ADC_T);
        assert_eq!(decode_raw20([0xFF, 0xFF, 0xFF]), 0xFFFFF);
    }

    #[test]
    fn datasheet_temperature() {
        let cal = Calibration::from_nvm(&DATASHEET_NVM);
        let (t_fine, celsius) = compensate_temperature(DATASHEET_ADC_T, &cal);
        assert_eq!(t_fine, 128422);
        assert_eq!(celsius, 25.08);
    }

    #[test]
    fn datasheet_pressure() {
        let cal = Calibration::from_nvm(&DATASHEET_NVM);
        let p = compensate_pressure(DATASHEET_ADC_P, 128422, &cal).unwrap();
        assert_eq!(p, 25767233);

        let pa = p as f64 / 256.0;
        assert!((pa - 100653.27).abs() < 0.05, "pression {}", pa);
    }

    #[test]
    fn zero_p1_is_a_singularity() {
        let mut cal = Calibration::from_nvm(&DATASHEET_NVM);
        cal.dig_p1 = 0;
        assert!(matches!(
            compensate_pressure(DATASHEET_ADC_P, 128422, &cal),
            Err(Error::ComputationSingularity)
        ));
    }

    /// Coefficients extrêmes, tous de même signe que ceux de la datasheet
    fn worst_case_calibration() -> Calibration {
        Calibration {
            dig_t1: u16::MAX,
            dig_t2: i16::MAX,
            dig_t3: i16::MIN,
            dig_p1: u16::MAX,
            dig_p2: i16::MIN,
            dig_p3: i16::MAX,
            dig_p4: i16::MAX,
            dig_p5: i16::MAX,
            dig_p6: i16::MIN,
            dig_p7: i16::MAX,
            dig_p8: i16::MIN,
            dig_p9: i16::MAX,
            sea_level_pa: 101325.0,
        }
    }

    #[test]
    fn saturated_temperature_read_does_not_overflow() {
        let mut cal = Calibration::from_nvm(&DATASHEET_NVM);
        cal.dig_t2 = 29000;
        let (t_fine, celsius) = compensate_temperature(0xFFFFF, &cal);
        assert_eq!(t_fine, 1077063 - 21553);
        assert!(celsius.is_finite());

        let cal = worst_case_calibration();
        for adc_t in [0, 0xFFFFF] {
            let (t_fine, celsius) = compensate_temperature(adc_t, &cal);
            assert!(celsius.is_finite());
            for adc_p in [0, 0xFFFFF] {
                // Aucun débordement: soit une pression, soit une erreur
                let _ = compensate_pressure(adc_p, t_fine, &cal);
            }
        }
    }

    #[test]
    fn negative_pressure_is_rejected() {
        let cal = Calibration::from_nvm(&DATASHEET_NVM);
        let (t_fine, _) = compensate_temperature(0, &cal);
        assert!(matches!(
            compensate_pressure(0xFFFFF, t_fine, &cal),
            Err(Error::ComputationSingularity)
        ));
    }

    #[test]
    fn altitude_at_reference_is_zero() {
        assert_eq!(altitude(101325.0, 101325.0), 0.0);
        let alt = altitude(100653.25390625, 101325.0);
        assert!((alt - 56.078).abs() < 0.01, "altitude {}", alt);
    }
}
