use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeMap;

/// Threshold table mapping a grade label to the minimum percentage that
/// earns it, e.g. `{"A": 90, "B": 75, "C": 60}`.
///
/// Stored as JSONB on the assessment row and decoded once at the
/// persistence boundary. Lookup only — never validated for completeness,
/// so a table without a floor entry simply yields no grade for low scores.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GradingSystem(pub BTreeMap<String, f64>);

impl GradingSystem {
    /// Returns the label with the highest threshold that the percentage
    /// meets, or `None` when no threshold is met. Equal thresholds break
    /// ties by label order.
    pub fn grade_for(&self, percentage: f64) -> Option<&str> {
        let mut entries: Vec<(&String, &f64)> = self.0.iter().collect();
        entries.sort_by(|a, b| b.1.partial_cmp(a.1).unwrap_or(Ordering::Equal));
        entries
            .into_iter()
            .find(|(_, min)| percentage >= **min)
            .map(|(label, _)| label.as_str())
    }
}
