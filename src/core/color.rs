use crate::domain::model::{Rgb, SlotStatus};

pub const FREE_GREEN: Rgb = Rgb::new(0.850_980_4, 0.917_647_06, 0.827_451);
pub const BUSY_RED: Rgb = Rgb::new(0.956_862_75, 0.8, 0.8);
pub const HOLIDAY_BLUE: Rgb = Rgb::new(0.8, 0.878_431_37, 0.956_862_75);
pub const DEFAULT_TOLERANCE: f64 = 0.1;

/// Maps a cell background to a slot status.
///
/// A color matches a reference only when every channel is strictly within
/// `tolerance`. References are tried free, busy, holiday; anything else is
/// [`SlotStatus::Unknown`], including white or otherwise uncolored cells.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColorClassifier {
    pub free: Rgb,
    pub busy: Rgb,
    pub holiday: Rgb,
    pub tolerance: f64,
}

impl Default for ColorClassifier {
    fn default() -> Self {
        Self {
            free: FREE_GREEN,
            busy: BUSY_RED,
            holiday: HOLIDAY_BLUE,
            tolerance: DEFAULT_TOLERANCE,
        }
    }
}

impl ColorClassifier {
    pub fn classify(&self, color: Rgb) -> SlotStatus {
        let references = [
            (self.free, SlotStatus::Free),
            (self.busy, SlotStatus::Busy),
            (self.holiday, SlotStatus::Holiday),
        ];

        references
            .iter()
            .find(|(reference, _)| self.is_similar(color, *reference))
            .map(|(_, status)| *status)
            .unwrap_or(SlotStatus::Unknown)
    }

    fn is_similar(&self, a: Rgb, b: Rgb) -> bool {
        (a.red - b.red).abs() < self.tolerance
            && (a.green - b.green).abs() < self.tolerance
            && (a.blue - b.blue).abs() < self.tolerance
    }
}
