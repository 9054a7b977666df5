//! Path-flow renormalization and replicator route choice.

use cf_core::numeric::thresholds::{DEMAND_MIN, FLOW_FLOOR, FLOW_SUM_MIN};
use cf_core::Real;

/// Rescale raw path flows so they sum to `target`.
///
/// Raw values are floored at a small positive value first; when their sum is
/// negligible the target is split uniformly. `out` must match `raw` in length.
pub fn renormalize(raw: &[Real], target: Real, out: &mut [Real]) {
    debug_assert_eq!(raw.len(), out.len());
    if raw.is_empty() {
        return;
    }

    let sum: Real = raw.iter().map(|y| y.max(FLOW_FLOOR)).sum();
    if sum > FLOW_SUM_MIN {
        let scale = target / sum;
        for (o, y) in out.iter_mut().zip(raw) {
            *o = y.max(FLOW_FLOOR) * scale;
        }
    } else {
        out.fill(target / raw.len() as Real);
    }
}

/// Replicator rates `eta * y_p * (avg - c_p)` with `avg = sum(y * c) / demand`.
///
/// Groups with negligible demand get zero rates.
pub fn replicator_rates(flows: &[Real], costs: &[Real], demand: Real, eta: Real, out: &mut [Real]) {
    debug_assert_eq!(flows.len(), costs.len());
    debug_assert_eq!(flows.len(), out.len());

    if demand <= DEMAND_MIN {
        out.fill(0.0);
        return;
    }

    let avg: Real = flows.iter().zip(costs).map(|(y, c)| y * c).sum::<Real>() / demand;
    for ((o, y), c) in out.iter_mut().zip(flows).zip(costs) {
        *o = eta * y * (avg - c);
    }
}
