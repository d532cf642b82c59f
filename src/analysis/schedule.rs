use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Tab names too generic to label a match on their own
const GENERIC_TABS: [&str; 2] = ["Bracket", "Knockout Stage"];

/// A today-or-future match
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduleEntry {
    /// Local "HH:MM"
    pub time: String,
    pub team1: String,
    pub team2: String,
    pub score1: u32,
    pub score2: u32,
    pub best_of: u32,
    pub finished: bool,
    pub live: bool,
    pub region: String,
    pub tournament: String,
    pub tournament_index: usize,
    pub group: String,
}

/// Label shown next to a match: the tab, or the round for generic tabs
pub fn display_group(tab: Option<&str>, round: Option<&str>) -> String {
    let tab = tab.map(str::trim).unwrap_or_default();
    if !tab.is_empty() && !GENERIC_TABS.contains(&tab) {
        return tab.to_string();
    }
    round.map(str::trim).unwrap_or_default().to_string()
}

#[derive(Debug, Default)]
pub struct ScheduleBuilder {
    by_date: BTreeMap<NaiveDate, Vec<ScheduleEntry>>,
}

impl ScheduleBuilder {
    pub fn add(&mut self, date: NaiveDate, entry: ScheduleEntry) {
        self.by_date.entry(date).or_default().push(entry);
    }

    /// Nearest `days` dates, keyed "YYYY-MM-DD", each ordered by tournament then time
    pub fn build(self, days: usize) -> BTreeMap<String, Vec<ScheduleEntry>> {
        self.by_date
            .into_iter()
            .take(days)
            .map(|(date, mut entries)| {
                entries.sort_by(|a, b| {
                    a.tournament_index
                        .cmp(&b.tournament_index)
                        .then_with(|| a.time.cmp(&b.time))
                });
                (date.format("%Y-%m-%d").to_string(), entries)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(tournament_index: usize, time: &str, team1: &str) -> ScheduleEntry {
        ScheduleEntry {
            time: time.to_string(),
            team1: team1.to_string(),
            team2: "TBD".to_string(),
            score1: 0,
            score2: 0,
            best_of: 3,
            finished: false,
            live: false,
            region: "LCK".to_string(),
            tournament: format!("t{}", tournament_index),
            tournament_index,
            group: String::new(),
        }
    }

    fn date(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, day).unwrap()
    }

    #[test]
    fn test_display_group() {
        assert_eq!(display_group(Some("Week 3"), Some("Round 1")), "Week 3");
        assert_eq!(display_group(Some("Bracket"), Some("Semifinals")), "Semifinals");
        assert_eq!(display_group(Some("Knockout Stage"), None), "");
        assert_eq!(display_group(Some(""), Some("Finals")), "Finals");
        assert_eq!(display_group(None, None), "");
    }

    #[test]
    fn test_build_keeps_nearest_dates() {
        let mut builder = ScheduleBuilder::default();
        for day in [9, 3, 5, 2, 7] {
            builder.add(date(day), entry(0, "17:00", "T1"));
        }

        let schedule = builder.build(4);
        let keys: Vec<&str> = schedule.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["2026-03-02", "2026-03-03", "2026-03-05", "2026-03-07"]);
    }

    #[test]
    fn test_build_orders_by_tournament_then_time() {
        let mut builder = ScheduleBuilder::default();
        builder.add(date(2), entry(1, "15:00", "BLG"));
        builder.add(date(2), entry(0, "19:00", "GEN"));
        builder.add(date(2), entry(0, "17:00", "T1"));

        let schedule = builder.build(4);
        let order: Vec<&str> = schedule["2026-03-02"].iter().map(|e| e.team1.as_str()).collect();
        assert_eq!(order, vec!["T1", "GEN", "BLG"]);
    }
}
