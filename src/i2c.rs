use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::error::{Error, Result};

/// Accès registre par registre à un périphérique I2C.
///
/// Chaque opération est synchrone et bloque jusqu'à la fin de la transaction.
/// Un défaut du bus est remonté tel quel (`TransportFault`), sans nouvel essai.
pub trait RegisterBus {
    /// Ecrit un octet dans un registre 8 bits
    fn write_register(&mut self, address: u8, register: u8, value: u8) -> Result<()>;

    /// Lecture d'un octet dans un registre 8 bits
    fn read_register(&mut self, address: u8, register: u8) -> Result<u8>;

    /// Lecture de `buffer.len()` octets contigus à partir d'un registre, en une transaction
    fn read_block(&mut self, address: u8, register: u8, buffer: &mut [u8]) -> Result<()>;
}

impl<T: RegisterBus + ?Sized> RegisterBus for &mut T {
    fn write_register(&mut self, address: u8, register: u8, value: u8) -> Result<()> {
        (**self).write_register(address, register, value)
    }

    fn read_register(&mut self, address: u8, register: u8) -> Result<u8> {
        (**self).read_register(address, register)
    }

    fn read_block(&mut self, address: u8, register: u8, buffer: &mut [u8]) -> Result<()> {
        (**self).read_block(address, register, buffer)
    }
}

/// Identifie un périphérique: numéro de bus (`/dev/i2c-N`) et adresse 7 bits
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DeviceHandle {
    bus: u8,
    address: u8,
}

impl DeviceHandle {
    pub fn new(bus: u8, address: u8) -> Result<Self> {
        if address > 0x7F {
            return Err(Error::InvalidParameter(format!(
                "adresse I2C {:#04x} hors de la plage 7 bits",
                address
            )));
        }

        Ok(Self { bus, address })
    }

    pub fn bus(&self) -> u8 {
        self.bus
    }

    pub fn address(&self) -> u8 {
        self.address
    }
}

fn fault(address: u8, register: u8, cause: impl core::fmt::Debug) -> Error {
    Error::TransportFault {
        address,
        register,
        cause: format!("{:?}", cause),
    }
}

/// Bus I2C du noyau Linux via rppal (Raspberry Pi, BeagleBone, ...)
#[cfg(feature = "real-sensors")]
impl RegisterBus for rppal::i2c::I2c {
    fn write_register(&mut self, address: u8, register: u8, value: u8) -> Result<()> {
        self.set_slave_address(address as u16)
            .map_err(|e| fault(address, register, e))?;
        self.block_write(register, &[value])
            .map_err(|e| fault(address, register, e))
    }

    fn read_register(&mut self, address: u8, register: u8) -> Result<u8> {
        let mut buffer = [0u8; 1];
        self.read_block(address, register, &mut buffer)?;
        Ok(buffer[0])
    }

    fn read_block(&mut self, address: u8, register: u8, buffer: &mut [u8]) -> Result<()> {
        self.set_slave_address(address as u16)
            .map_err(|e| fault(address, register, e))?;
        self.block_read(register, buffer)
            .map_err(|e| fault(address, register, e))
    }
}

/// Adaptateur pour n'importe quel bus `embedded-hal` 1.0
pub struct HalBus<T> {
    i2c: T,
}

impl<T> HalBus<T> {
    pub fn new(i2c: T) -> Self {
        Self { i2c }
    }

    /// Rend le bus sous-jacent
    pub fn release(self) -> T {
        self.i2c
    }
}

impl<T: embedded_hal::i2c::I2c> RegisterBus for HalBus<T> {
    fn write_register(&mut self, address: u8, register: u8, value: u8) -> Result<()> {
        self.i2c
            .write(address, &[register, value])
            .map_err(|e| fault(address, register, e))
    }

    fn read_register(&mut self, address: u8, register: u8) -> Result<u8> {
        let mut buffer = [0u8; 1];
        self.read_block(address, register, &mut buffer)?;
        Ok(buffer[0])
    }

    fn read_block(&mut self, address: u8, register: u8, buffer: &mut [u8]) -> Result<()> {
        self.i2c
            .write_read(address, &[register], buffer)
            .map_err(|e| fault(address, register, e))
    }
}

/// Bus partagé entre plusieurs pilotes (BMP280 et MPU9250 sur le même /dev/i2c-N).
/// Le verrou est pris pour une transaction, pas pour une séquence.
pub struct SharedBus<T> {
    inner: Arc<Mutex<T>>,
}

impl<T> SharedBus<T> {
    pub fn new(bus: T) -> Self {
        Self {
            inner: Arc::new(Mutex::new(bus)),
        }
    }

    fn lock(&self) -> MutexGuard<'_, T> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<T> Clone for SharedBus<T> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<T: RegisterBus> RegisterBus for SharedBus<T> {
    fn write_register(&mut self, address: u8, register: u8, value: u8) -> Result<()> {
        self.lock().write_register(address, register, value)
    }

    fn read_register(&mut self, address: u8, register: u8) -> Result<u8> {
        self.lock().read_register(address, register)
    }

    fn read_block(&mut self, address: u8, register: u8, buffer: &mut [u8]) -> Result<()> {
        self.lock().read_block(address, register, buffer)
    }
}
