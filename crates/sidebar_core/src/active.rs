/// Viewport-relative geometry of one timeline entry.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EntryGeometry {
    pub top: f64,
    pub height: f64,
}

impl EntryGeometry {
    pub fn new(top: f64, height: f64) -> Self {
        Self { top, height }
    }

    fn center(&self) -> f64 {
        self.top + self.height / 2.0
    }
}

/// Selects the entry whose vertical center is nearest to `center`.
///
/// Entries with zero rendered height are currently detached or virtualized
/// and are skipped. Ties go to the lowest index (earliest turn). Returns
/// `None` when no entry qualifies.
pub fn recompute_active(entries: &[EntryGeometry], center: f64) -> Option<usize> {
    let mut best: Option<(usize, f64)> = None;
    for (index, entry) in entries.iter().enumerate() {
        if entry.height == 0.0 {
            continue;
        }
        let distance = (entry.center() - center).abs();
        match best {
            Some((_, best_distance)) if distance >= best_distance => {}
            _ => best = Some((index, distance)),
        }
    }
    best.map(|(index, _)| index)
}
