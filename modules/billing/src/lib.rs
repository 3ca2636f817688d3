//! Billing feature module.
//!
//! Demonstration module for the registration kit: exports itself as the
//! `billing` code unit and wires an invoice-total service into the container.

mod module;
pub use module::Billing;

pub mod domain;
pub use domain::{InvoiceCalculator, InvoiceService};
