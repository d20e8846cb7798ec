use serde::Serialize;

/// Comfort band used to colour map markers.
///
/// | Range          | Band        | Colour  |
/// |----------------|-------------|---------|
/// | < 1            | VeryLow     | blue    |
/// | 1 <= rci < 2   | Low         | green   |
/// | 2 <= rci < 3   | Moderate    | yellow  |
/// | 3 <= rci < 4   | High        | orange  |
/// | 4 <= rci < 5   | VeryHigh    | red     |
/// | >= 5           | Extreme     | darkred |
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RciBand {
    VeryLow,
    Low,
    Moderate,
    High,
    VeryHigh,
    Extreme,
}

impl RciBand {
    pub fn colour(self) -> &'static str {
        match self {
            RciBand::VeryLow => "blue",
            RciBand::Low => "green",
            RciBand::Moderate => "yellow",
            RciBand::High => "orange",
            RciBand::VeryHigh => "red",
            RciBand::Extreme => "darkred",
        }
    }
}

/// Classifies a comfort index into its display band.
pub fn band(rci: f64) -> RciBand {
    match rci {
        r if r < 1.0 => RciBand::VeryLow,
        r if r < 2.0 => RciBand::Low,
        r if r < 3.0 => RciBand::Moderate,
        r if r < 4.0 => RciBand::High,
        r if r < 5.0 => RciBand::VeryHigh,
        _ => RciBand::Extreme,
    }
}

/// Number of values falling in each band.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BandCounts {
    pub very_low: usize,
    pub low: usize,
    pub moderate: usize,
    pub high: usize,
    pub very_high: usize,
    pub extreme: usize,
}

impl BandCounts {
    pub fn from_values(values: impl IntoIterator<Item = f64>) -> Self {
        let mut counts = BandCounts::default();
        for rci in values {
            counts.add(rci);
        }
        counts
    }

    pub fn add(&mut self, rci: f64) {
        match band(rci) {
            RciBand::VeryLow => self.very_low += 1,
            RciBand::Low => self.low += 1,
            RciBand::Moderate => self.moderate += 1,
            RciBand::High => self.high += 1,
            RciBand::VeryHigh => self.very_high += 1,
            RciBand::Extreme => self.extreme += 1,
        }
    }

    pub fn total(&self) -> usize {
        self.very_low + self.low + self.moderate + self.high + self.very_high + self.extreme
    }
}
