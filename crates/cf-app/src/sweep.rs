//! Parallel parameter sweeps over independent scenario variants.

use rayon::prelude::*;
use tracing::info;

use cf_project::schema::{ScenarioFile, StationDef};

use crate::compile::compile_scenario;
use crate::error::AppResult;
use crate::run::{RunReport, run_scenario};

/// Run one variant of `base` per value, in parallel.
///
/// `apply` edits a private copy of the base scenario. Results come back in
/// the order of `values`.
pub fn sweep<V, F>(base: &ScenarioFile, values: &[V], apply: F) -> Vec<AppResult<RunReport>>
where
    V: Sync,
    F: Fn(&mut ScenarioFile, &V) + Sync,
{
    info!(scenario = %base.name, variants = values.len(), "starting sweep");
    values
        .par_iter()
        .map(|value| {
            let mut scenario = base.clone();
            apply(&mut scenario, value);
            let runtime = compile_scenario(&scenario)?;
            run_scenario(&runtime)
        })
        .collect()
}

/// Set every price of `station` in `scenario` to `price`.
///
/// A station without an entry gets a fixed one built from the scenario's
/// default parameters.
pub fn set_station_price(scenario: &mut ScenarioFile, station: &str, price: f64) {
    let stations = &mut scenario.stations;
    match stations.entries.iter_mut().find(|e| e.id() == station) {
        Some(StationDef::Fixed { params, .. }) => params.price = price,
        Some(StationDef::Piecewise { segments, .. }) => {
            for segment in segments {
                segment.params.price = price;
            }
        }
        None => {
            let mut params = stations.default.unwrap_or_default();
            params.price = price;
            stations.entries.push(StationDef::Fixed {
                id: station.to_string(),
                params,
            });
        }
    }
}

/// Sweep the price of one station.
pub fn price_sweep(
    base: &ScenarioFile,
    station: &str,
    prices: &[f64],
) -> Vec<AppResult<RunReport>> {
    sweep(base, prices, |scenario, price| {
        set_station_price(scenario, station, *price)
    })
}
