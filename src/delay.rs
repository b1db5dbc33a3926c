use embedded_hal::delay::DelayNs;
use std::thread::sleep;
use std::time::Duration;

/// Attente bloquante du thread courant, pour les délais imposés par les capteurs
#[derive(Clone, Copy, Debug, Default)]
pub struct SleepDelay;

impl DelayNs for SleepDelay {
    fn delay_ns(&mut self, ns: u32) {
        sleep(Duration::from_nanos(ns as u64));
    }

    fn delay_ms(&mut self, ms: u32) {
        sleep(Duration::from_millis(ms as u64));
    }
}
