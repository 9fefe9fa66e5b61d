use crate::models::{DEPARTMENTS, FuelCatalog, Metrics, SalePoints, department_index};

/// Running sum for one (fuel, department) cell.
#[derive(Debug, Clone, Copy, Default)]
struct Acc {
    total: f64,
    count: usize,
}

impl Acc {
    fn push(&mut self, v: f64) {
        self.total += v;
        self.count += 1;
    }

    fn mean(&self) -> Option<f64> {
        (self.count > 0).then(|| self.total / self.count as f64)
    }
}

/// Average each fuel per department over a sale-point listing.
///
/// Only positive prices count. The department comes from the postcode; rows whose
/// postcode maps to no department still count toward the national average.
/// The national average is taken over every counted price, not over department means.
pub fn build_metrics(sale_points: &SalePoints) -> Metrics {
    let fuels = sale_points.fuel_names();
    let mut cells = vec![vec![Acc::default(); DEPARTMENTS.len()]; fuels.len()];
    let mut global = vec![Acc::default(); fuels.len()];
    let mut unplaced = 0usize;

    for point in &sale_points.data {
        let dept = department_index(&point.postcode);
        if dept.is_none() {
            unplaced += 1;
        }
        for (fuel, &price) in point.prices.iter().enumerate().take(fuels.len()) {
            if price <= 0.0 {
                continue;
            }
            global[fuel].push(price);
            if let Some(d) = dept {
                cells[fuel][d].push(price);
            }
        }
    }
    if unplaced > 0 {
        log::warn!("{} sale points have a postcode outside any department", unplaced);
    }
    log::debug!(
        "built metrics over {} sale points and {} fuel types",
        sale_points.len(),
        fuels.len()
    );

    Metrics {
        fuel_types: FuelCatalog::from_names(fuels),
        departments: DEPARTMENTS.clone(),
        averages_global: global.iter().map(Acc::mean).collect(),
        averages_by_departments: cells
            .iter()
            .map(|row| row.iter().map(Acc::mean).collect())
            .collect(),
    }
}
