use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Column index of the per-row total, after Monday..Sunday
pub const TOTAL_COLUMN: usize = 7;

/// One finished match as listed inside a grid cell
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GridMatch {
    /// Local "MM-DD"
    pub date: String,
    pub team1: String,
    pub team2: String,
    pub score: String,
    pub full_length: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SlotCell {
    pub total: u32,
    pub full: u32,
    pub matches: Vec<GridMatch>,
}

impl SlotCell {
    fn add(&mut self, entry: &GridMatch) {
        self.total += 1;
        self.full += u32::from(entry.full_length);
        self.matches.push(entry.clone());
    }
}

/// Monday..Sunday plus the total column
pub type WeekRow = [SlotCell; 8];

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RegionGrid {
    /// Hour bucket -> week row
    pub slots: BTreeMap<u32, WeekRow>,
    pub total: WeekRow,
}

/// Distribution of finished matches over local kick-off hour and weekday
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TimeSlotGrid {
    pub regions: BTreeMap<String, RegionGrid>,
    /// Every region combined
    pub all: WeekRow,
}

impl TimeSlotGrid {
    /// Empty grid with the configured slot rows already present
    pub fn with_regions<'a>(
        regions: impl IntoIterator<Item = &'a str>,
        region_slots: &BTreeMap<String, Vec<u32>>,
    ) -> Self {
        let mut grid = Self::default();
        for region in regions {
            let entry = grid.regions.entry(region.to_string()).or_default();
            for hour in region_slots.get(region).into_iter().flatten() {
                entry.slots.entry(*hour).or_default();
            }
        }
        grid
    }

    pub fn record(&mut self, region: &str, slots: &[u32], hour: u32, weekday: usize, entry: &GridMatch) {
        if weekday >= TOTAL_COLUMN {
            return;
        }

        let bucket = bucket_hour(slots, hour);
        let region_grid = self.regions.entry(region.to_string()).or_default();
        let row = region_grid.slots.entry(bucket).or_default();
        row[weekday].add(entry);
        row[TOTAL_COLUMN].add(entry);
        region_grid.total[weekday].add(entry);
        region_grid.total[TOTAL_COLUMN].add(entry);

        self.all[weekday].add(entry);
        self.all[TOTAL_COLUMN].add(entry);
    }
}

/// First slot at or after `hour`; the last slot absorbs anything later.
/// Without configured slots the raw hour is its own bucket.
pub fn bucket_hour(slots: &[u32], hour: u32) -> u32 {
    let mut sorted = slots.to_vec();
    sorted.sort_unstable();
    sorted
        .iter()
        .copied()
        .find(|slot| hour <= *slot)
        .or_else(|| sorted.last().copied())
        .unwrap_or(hour)
}
