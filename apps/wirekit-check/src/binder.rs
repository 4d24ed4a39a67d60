use std::any::Any;
use std::collections::HashSet;
use std::sync::Arc;

use anyhow::{bail, Result};
use wirekit::{Binder, BindingKey};

/// Binder that only records which keys modules bind; duplicate keys are rejected.
#[derive(Debug, Default)]
pub struct RecordingBinder {
    order: Vec<BindingKey>,
    seen: HashSet<BindingKey>,
}

impl RecordingBinder {
    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn keys(&self) -> &[BindingKey] {
        &self.order
    }
}

impl Binder for RecordingBinder {
    fn bind_instance(&mut self, key: BindingKey, _value: Arc<dyn Any + Send + Sync>) -> Result<()> {
        if !self.seen.insert(key.clone()) {
            match &key.qualifier {
                Some(q) => bail!("'{}' named '{}' is already bound", key.type_name, q),
                None => bail!("'{}' is already bound", key.type_name),
            }
        }
        tracing::trace!(binding = key.type_name, qualifier = ?key.qualifier, "Bound");
        self.order.push(key);
        Ok(())
    }
}
