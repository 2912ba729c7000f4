//! Price Smoother
//!
//! Averages observed prices into a stabilized starting price once at least
//! [`MIN_SAMPLES`] observations exist.

use rust_decimal::Decimal;

/// Observations required before a smoothed price is produced
pub const MIN_SAMPLES: usize = 4;

#[derive(Debug, Clone, Default)]
pub struct PriceSmoother {
    /// Observed prices, oldest first
    history: Vec<Decimal>,
    /// Optional cap on history length. `None` keeps every sample.
    window: Option<usize>,
    smoothed: Option<Decimal>,
}

impl PriceSmoother {
    /// Smoother that averages over every sample ever observed
    pub fn new() -> Self {
        Self::default()
    }

    /// Smoother that only averages over the last `window` samples.
    ///
    /// Windows smaller than [`MIN_SAMPLES`] are widened to it, otherwise no
    /// smoothed price would ever be produced.
    pub fn with_window(window: usize) -> Self {
        Self {
            history: Vec::with_capacity(window.max(MIN_SAMPLES)),
            window: Some(window.max(MIN_SAMPLES)),
            smoothed: None,
        }
    }

    /// Record a price and return the smoothed price if enough samples exist
    pub fn observe(&mut self, price: Decimal) -> Option<Decimal> {
        self.history.push(price);

        if let Some(window) = self.window {
            if self.history.len() > window {
                self.history.remove(0);
            }
        }

        if self.history.len() < MIN_SAMPLES {
            self.smoothed = None;
            return None;
        }

        let sum: Decimal = self.history.iter().sum();
        let mean = sum / Decimal::from(self.history.len());
        self.smoothed = Some(mean);
        self.smoothed
    }

    /// Last smoothed price, if any
    pub fn smoothed(&self) -> Option<Decimal> {
        self.smoothed
    }

    pub fn len(&self) -> usize {
        self.history.len()
    }

    pub fn is_empty(&self) -> bool {
        self.history.is_empty()
    }

    pub fn history(&self) -> &[Decimal] {
        &self.history
    }
}
