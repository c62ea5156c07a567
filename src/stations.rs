use serde::Serialize;
use std::fmt;

use crate::StationList;

const MIN_STATION_FIELDS: usize = 6;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
/// A station of the station table.
pub struct StationItem {
    short_name: String,
    name: String,
    code: String,
    english_name: String,
    index: String,
}

impl StationItem {
    pub fn new(short_name: &str, name: &str, code: &str, english_name: &str, index: &str) -> Self {
        StationItem {
            short_name: short_name.to_string(),
            name: name.to_string(),
            code: code.to_string(),
            english_name: english_name.to_string(),
            index: index.to_string(),
        }
    }

    /// Returns the pinyin abbreviation, e.g. `bjx`.
    #[inline]
    pub fn short_name(&self) -> &str {
        &self.short_name
    }

    /// Returns the name of the station.
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the telecode used by the queries, e.g. `BXP`.
    #[inline]
    pub fn code(&self) -> &str {
        &self.code
    }

    /// Returns the full pinyin name.
    #[inline]
    pub fn english_name(&self) -> &str {
        &self.english_name
    }

    #[inline]
    pub fn index(&self) -> &str {
        &self.index
    }
}

impl fmt::Display for StationItem {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{} - {} ({})", self.code, self.name, self.english_name)
    }
}

/// Parses the `station_name.js` table.
///
/// The table is a JS assignment of one string where stations are separated
/// by `@` and fields by `|`:
/// `var station_names ='@bjb|北京北|VAP|beijingbei|bjb|0@...';`.
/// Rows with too few fields are skipped.
pub fn parse_station_list(text: &str) -> StationList {
    let mut text = text.trim().trim_end_matches(';').trim();
    if let Some((head, tail)) = text.split_once('=') {
        if head.trim_start().starts_with("var ") {
            text = tail.trim();
        }
    }
    let text = text.trim_matches(|c| c == '\'' || c == '"');

    let stations: Vec<StationItem> = text
        .split('@')
        .skip(1)
        .filter_map(|row| {
            let fields: Vec<&str> = row.split('|').collect();
            if fields.len() < MIN_STATION_FIELDS {
                warn!("skipping station row `{}`", row);
                return None;
            }
            Some(StationItem::new(
                fields[0], fields[1], fields[2], fields[3], fields[5],
            ))
        })
        .collect();
    debug!("{} stations parsed", stations.len());

    StationList::new(stations)
}

/// Finds a station by its exact name.
pub fn find_station_by_name<'a>(stations: &'a [StationItem], name: &str) -> Option<&'a StationItem> {
    let found = stations.iter().find(|s| s.name == name);
    trace!("searching {}...{}", name, if found.is_some() { "ok" } else { "nok" });
    found
}

#[cfg(test)]
mod tests {
    use super::{find_station_by_name, parse_station_list, StationItem};

    const STATION_JS: &str = "var station_names ='@bjb|北京北|VAP|beijingbei|bjb|0@bjd|北京东|BOP|beijingdong|bjd|1@bji|北京|BJP|beijing|bj|2@bjn|北京南|VNP|beijingnan|bjn|3@bjx|北京西|BXP|beijingxi|bjx|4@sha|上海|SHH|shanghai|sh|5';";

    #[test]
    fn station_list_parse_test() {
        let stations = parse_station_list(STATION_JS);

        assert_eq!(stations.len(), 6);
        assert_eq!(
            stations.as_slice()[0],
            StationItem::new("bjb", "北京北", "VAP", "beijingbei", "0")
        );
        assert_eq!(
            stations.as_slice()[5],
            StationItem::new("sha", "上海", "SHH", "shanghai", "5")
        );
    }

    #[test]
    fn station_list_idempotent_test() {
        assert_eq!(parse_station_list(STATION_JS), parse_station_list(STATION_JS));
    }

    #[test]
    fn station_list_edge_test() {
        assert!(parse_station_list("").is_empty());
        assert!(parse_station_list("var station_names ='';").is_empty());

        // short rows are dropped, longer rows keep the known positions
        let stations = parse_station_list("'@bjb|北京北|VAP@bjx|北京西|BXP|beijingxi|bjx|4|1|北京'");
        assert_eq!(stations.len(), 1);
        assert_eq!(stations.as_slice()[0].code(), "BXP");
        assert_eq!(stations.as_slice()[0].index(), "4");
    }

    #[test]
    fn find_station_test() {
        let stations = parse_station_list(STATION_JS);

        let found = find_station_by_name(stations.as_slice(), "北京西").unwrap();
        assert_eq!(found.code(), "BXP");
        assert_eq!(found.short_name(), "bjx");

        assert!(find_station_by_name(stations.as_slice(), "北京西站").is_none());
        assert!(find_station_by_name(&[], "北京").is_none());
    }
}
