//! Invoice calculation domain service.

/// Computes invoice totals.
pub trait InvoiceCalculator: Send + Sync {
    /// Total in minor units, tax included.
    fn total_with_tax(&self, net: u64) -> u64;
}

/// Default calculator with a flat tax rate.
#[derive(Debug, Clone)]
pub struct InvoiceService {
    tax_rate_percent: u64,
}

impl InvoiceService {
    #[must_use]
    pub const fn new(tax_rate_percent: u64) -> Self {
        Self { tax_rate_percent }
    }
}

impl InvoiceCalculator for InvoiceService {
    fn total_with_tax(&self, net: u64) -> u64 {
        let tax = net.saturating_mul(self.tax_rate_percent) / 100;
        net.saturating_add(tax)
    }
}
