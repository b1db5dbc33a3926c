use embedded_hal::delay::DelayNs;
use log::{debug, warn};
use serde::{Deserialize, Serialize};

use super::compensation::{self, MagAdjustment};
use super::registry;
use crate::error::Result;
use crate::i2c::RegisterBus;
use crate::sensors::Triplet;

/// Magnétomètre AK8963, accessible directement une fois le bypass I2C du MPU9250 actif
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Ak8963 {
    address: u8,
    adjustment: MagAdjustment,
}

impl Ak8963 {
    /// Lecture de la fuse ROM puis passage en mesure continue 16 bits, 100 Hz
    pub fn bring_up<B: RegisterBus, D: DelayNs>(bus: &mut B, delay: &mut D) -> Result<Self> {
        let address = registry::AK8963_ADDR;

        Self::set_mode(bus, delay, registry::AK8963_POWER_DOWN)?;
        Self::set_mode(bus, delay, registry::AK8963_FUSE_ROM)?;

        let mut asa = [0u8; registry::AK8963_ASA_LEN];
        bus.read_block(address, registry::AK8963_ASAX, &mut asa)?;
        let adjustment = MagAdjustment::from_fuse_rom(asa);
        debug!("[AK8963] ASA brut: {:?} -> {:?}", asa, adjustment);

        Self::set_mode(bus, delay, registry::AK8963_POWER_DOWN)?;
        Self::set_mode(bus, delay, registry::AK8963_CONT_16BIT_100HZ)?;

        Ok(Ak8963 { address, adjustment })
    }

    // Chaque changement de mode demande un délai avant la commande suivante
    fn set_mode<B: RegisterBus, D: DelayNs>(bus: &mut B, delay: &mut D, mode: u8) -> Result<()> {
        bus.write_register(registry::AK8963_ADDR, registry::AK8963_CNTL1, mode)?;
        delay.delay_ms(registry::AK8963_MODE_DELAY_MS);
        Ok(())
    }

    pub fn adjustment(&self) -> &MagAdjustment {
        &self.adjustment
    }

    /// Champ magnétique en µT, dans le repère de l'accéléromètre
    pub fn read<B: RegisterBus>(&self, bus: &mut B) -> Result<Triplet> {
        let mut raw = [0u8; registry::AK8963_DATA_LEN];
        bus.read_block(self.address, registry::AK8963_HXL, &mut raw)?;

        // La lecture de ST2 libère le verrou de la mesure suivante
        let st2 = bus.read_register(self.address, registry::AK8963_ST2)?;
        if st2 & registry::AK8963_HOFL != 0 {
            warn!("[AK8963] Saturation du capteur (ST2 = {:#04x})", st2);
        }

        let axes = compensation::decode_le_axes(&raw);
        Ok(compensation::remap_magnetometer(axes, &self.adjustment))
    }
}
