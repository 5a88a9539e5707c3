//! Dashboard interaction state.
//!
//! Which metric sections are expanded. Toggling one section never touches
//! another; on a fresh dashboard only the retention section is open.

use crate::models::MetricKind;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SectionToggles {
    retention: bool,
    revenue: bool,
    arpu: bool,
    ltv: bool,
}

impl Default for SectionToggles {
    fn default() -> Self {
        Self {
            retention: true,
            revenue: false,
            arpu: false,
            ltv: false,
        }
    }
}

impl SectionToggles {
    /// Everything collapsed.
    pub fn collapsed() -> Self {
        Self {
            retention: false,
            revenue: false,
            arpu: false,
            ltv: false,
        }
    }

    pub fn is_expanded(&self, kind: MetricKind) -> bool {
        *self.slot(kind)
    }

    /// Flip one section and return its new state.
    pub fn toggle(&mut self, kind: MetricKind) -> bool {
        let slot = self.slot_mut(kind);
        *slot = !*slot;
        *slot
    }

    pub fn set(&mut self, kind: MetricKind, expanded: bool) {
        *self.slot_mut(kind) = expanded;
    }

    pub fn expanded(&self) -> impl Iterator<Item = MetricKind> + '_ {
        MetricKind::ALL.into_iter().filter(|k| self.is_expanded(*k))
    }

    fn slot(&self, kind: MetricKind) -> &bool {
        match kind {
            MetricKind::Retention => &self.retention,
            MetricKind::Revenue => &self.revenue,
            MetricKind::Arpu => &self.arpu,
            MetricKind::Ltv => &self.ltv,
        }
    }

    fn slot_mut(&mut self, kind: MetricKind) -> &mut bool {
        match kind {
            MetricKind::Retention => &mut self.retention,
            MetricKind::Revenue => &mut self.revenue,
            MetricKind::Arpu => &mut self.arpu,
            MetricKind::Ltv => &mut self.ltv,
        }
    }
}
