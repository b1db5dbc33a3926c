use serde::{Deserialize, Serialize};
use std::fmt;

pub mod baro;
pub mod imu;
pub mod reader;

#[cfg(feature = "fake-sensors")]
pub mod sim;

/// Cycle de vie d'un pilote.
///
/// `S` désigne l'étape d'initialisation en cours, `R` les constantes
/// disponibles une fois prêt. Les lectures ne sont possibles qu'en `Ready`,
/// il n'existe donc pas de lecture avec une calibration vide.
#[derive(Clone, Debug, PartialEq)]
pub enum Lifecycle<S, R> {
    Uninitialized,
    Configuring(S),
    Ready(R),
    /// Etat terminal: étape à laquelle l'initialisation a échoué
    Failed(S),
}

impl<S, R> Lifecycle<S, R> {
    pub fn is_ready(&self) -> bool {
        matches!(self, Lifecycle::Ready(_))
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, Lifecycle::Failed(_))
    }
}

/// Mesure sur trois axes, en unités physiques
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Triplet {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Triplet {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Triplet { x, y, z }
    }
}

impl fmt::Display for Triplet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "X: {:.4} Y: {:.4} Z: {:.4}", self.x, self.y, self.z)
    }
}
