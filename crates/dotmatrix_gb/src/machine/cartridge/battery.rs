use std::fs;
use std::io;
use std::path::PathBuf;

use crate::error::CartridgeError;

/// External cartridge RAM, optionally mirrored to a save file.
#[derive(Clone, Debug, Default)]
pub struct BatteryRam {
    data: Vec<u8>,
    path: Option<PathBuf>,
    dirty: bool,
}

impl BatteryRam {
    pub fn new(size: usize, path: Option<PathBuf>) -> Self {
        Self {
            data: vec![0xFF; size],
            path,
            dirty: false,
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    #[inline]
    pub fn read(&self, offset: usize) -> u8 {
        self.data.get(offset).copied().unwrap_or(0xFF)
    }

    #[inline]
    pub fn write(&mut self, offset: usize, value: u8) {
        if let Some(slot) = self.data.get_mut(offset) {
            if *slot != value {
                *slot = value;
                self.dirty = true;
            }
        }
    }

    pub fn bytes(&self) -> &[u8] {
        &self.data
    }

    pub fn restore(&mut self, bytes: &[u8]) {
        let n = bytes.len().min(self.data.len());
        self.data[..n].copy_from_slice(&bytes[..n]);
    }

    /// Write the RAM to its save file if it changed since the last save.
    pub fn save(&mut self) -> Result<(), CartridgeError> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        if !self.dirty {
            return Ok(());
        }
        fs::write(path, &self.data)?;
        self.dirty = false;
        log::debug!("GB cart: saved {} bytes to {}", self.data.len(), path.display());
        Ok(())
    }

    /// Load the save file if one exists.
    pub fn load(&mut self) -> Result<(), CartridgeError> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        match fs::read(path) {
            Ok(bytes) => {
                log::info!("GB cart: loaded {} bytes from {}", bytes.len(), path.display());
                self.restore(&bytes);
                self.dirty = false;
                Ok(())
            }
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err.into()),
        }
    }
}
