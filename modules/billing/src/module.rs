use std::any::Any;
use std::sync::Arc;

use modwire::{Container, ContainerExt, Module, ModuleBase};

use crate::domain::{InvoiceCalculator, InvoiceService};

/// Billing module: wires the invoice service into the container.
pub struct Billing {
    base: ModuleBase,
}

impl Default for Billing {
    fn default() -> Self {
        Self {
            base: ModuleBase::of::<Self>(),
        }
    }
}

impl Module for Billing {
    fn info(&self) -> &ModuleBase {
        &self.base
    }

    fn info_mut(&mut self) -> &mut ModuleBase {
        &mut self.base
    }

    fn register_services(&self, container: &dyn Container) -> anyhow::Result<()> {
        let service: Arc<dyn InvoiceCalculator> = Arc::new(InvoiceService::new(20));
        container.register(service);
        tracing::debug!("billing services registered");
        Ok(())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

modwire::module_unit!(Billing);
