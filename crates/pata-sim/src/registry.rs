//! In-memory stand-in for the host's block device registry.

use std::collections::HashMap;
use std::sync::Arc;

use pata_pio::{AtaError, BlockDevice, DeviceRegistry, Result};

/// Names devices `<class><n>` in registration order, with a per-class
/// counter, and keeps aliases separate so tests can tell them apart.
#[derive(Default)]
pub struct MemRegistry {
    devices: Vec<(String, Arc<dyn BlockDevice>)>,
    aliases: Vec<(String, Arc<dyn BlockDevice>)>,
    class_counts: HashMap<&'static str, usize>,
    register_calls: usize,
    fail_after: Option<usize>,
}

impl MemRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry that rejects every registration after the first `n`.
    pub fn failing_after(n: usize) -> Self {
        Self {
            fail_after: Some(n),
            ..Self::default()
        }
    }

    /// Looks up a device by its registered name or an alias.
    pub fn device(&self, name: &str) -> Option<Arc<dyn BlockDevice>> {
        self.devices
            .iter()
            .chain(self.aliases.iter())
            .find(|(bound, _)| bound == name)
            .map(|(_, device)| device.clone())
    }

    /// Registered names, in registration order.
    pub fn device_names(&self) -> Vec<String> {
        self.devices.iter().map(|(name, _)| name.clone()).collect()
    }

    pub fn alias_names(&self) -> Vec<String> {
        self.aliases.iter().map(|(name, _)| name.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.devices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.devices.is_empty()
    }
}

impl DeviceRegistry for MemRegistry {
    fn register(&mut self, device: Arc<dyn BlockDevice>) -> Result<String> {
        self.register_calls += 1;
        if let Some(limit) = self.fail_after {
            if self.register_calls > limit {
                return Err(AtaError::Registration("registry is full".to_string()));
            }
        }
        let class = device.device_class();
        let count = self.class_counts.entry(class).or_insert(0);
        let name = format!("{class}{count}");
        *count += 1;
        self.devices.push((name.clone(), device));
        Ok(name)
    }

    fn add_alias(&mut self, alias: &str, device: Arc<dyn BlockDevice>) -> Result<()> {
        if self.device(alias).is_some() {
            return Err(AtaError::Registration(format!(
                "name {alias} is already bound"
            )));
        }
        self.aliases.push((alias.to_string(), device));
        Ok(())
    }
}
