//! Station price behavior.

use cf_core::numeric::thresholds::PRICE_FLOOR;
use cf_core::Real;

use crate::stations::StationParams;

/// How station prices evolve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PricingMode {
    /// Prices are state variables driven by the queue-margin law.
    #[default]
    Adaptive,
    /// Prices are read from the station parameter provider; no price state.
    Scheduled,
}

impl PricingMode {
    pub fn has_price_state(self) -> bool {
        matches!(self, PricingMode::Adaptive)
    }
}

/// Prices never drop below a small positive floor.
pub fn floor_price(price: Real) -> Real {
    price.max(PRICE_FLOOR)
}

/// Price derivative `kappa * (queue - (price - cost))`.
pub fn price_rate(params: &StationParams, price: Real, queue: Real) -> Real {
    params.price_speed * (queue - (price - params.operating_cost))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn price_rises_with_queue_pressure() {
        let params = StationParams::default();
        assert!(price_rate(&params, 0.5, 1.0) > 0.0);
        assert!(price_rate(&params, 0.5, 0.0) < 0.0);
        // Margin equals queue: no adjustment
        assert!(price_rate(&params, 0.3, 0.2).abs() < 1e-15);
    }

    #[test]
    fn zero_speed_freezes_price() {
        let params = StationParams {
            price_speed: 0.0,
            ..StationParams::default()
        };
        assert_eq!(price_rate(&params, 0.5, 10.0), 0.0);
    }

    #[test]
    fn floor() {
        assert_eq!(floor_price(-1.0), PRICE_FLOOR);
        assert_eq!(floor_price(0.4), 0.4);
    }
}
