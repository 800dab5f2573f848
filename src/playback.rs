//! Day-by-day marker playback over a fetched series
//!
//! Display helpers are lenient: bad input is logged and ignored, never
//! returned as an error.

use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::warn;

use crate::formatters::{format_day_summary, format_metric_value};
use crate::models::AggregationResult;

/// One marker per observed date, all at the query location
#[derive(Debug, Clone, PartialEq)]
pub struct Marker {
    pub date: String,
    pub latitude: f64,
    pub longitude: f64,
    pub visible: bool,
    pub description: String,
}

/// Caller-owned playback state. Built from a finished aggregation, so the
/// series it reads is always the one the markers were created from.
#[derive(Debug)]
pub struct PlaybackSession {
    result: AggregationResult,
    markers: Vec<Marker>,
    active: usize,
}

impl PlaybackSession {
    pub const DEFAULT_DELAY: Duration = Duration::from_millis(2000);

    /// Creates one marker per date of the first requested parameter.
    /// Only the first marker starts visible.
    pub fn new(result: AggregationResult) -> Self {
        let dates: Vec<String> = result
            .meta
            .parameters
            .first()
            .and_then(|code| result.daily.get(code))
            .map(|series| series.keys().cloned().collect())
            .unwrap_or_default();

        let markers = dates
            .into_iter()
            .enumerate()
            .map(|(i, date)| Marker {
                description: format_day_summary(&result.daily, &date),
                date,
                latitude: result.meta.lat,
                longitude: result.meta.lon,
                visible: i == 0,
            })
            .collect();

        Self {
            result,
            markers,
            active: 0,
        }
    }

    pub fn result(&self) -> &AggregationResult {
        &self.result
    }

    pub fn markers(&self) -> &[Marker] {
        &self.markers
    }

    /// Index of the shown marker, `None` when nothing was fetched
    pub fn active_index(&self) -> Option<usize> {
        (!self.markers.is_empty()).then_some(self.active)
    }

    pub fn visible_markers(&self) -> impl Iterator<Item = (usize, &Marker)> {
        self.markers.iter().enumerate().filter(|(_, m)| m.visible)
    }

    /// Shows only the marker at `index` and describes it with `metric`'s
    /// value for that day. Returns false, changing nothing, when the index
    /// or metric is unknown.
    pub fn select_day(&mut self, index: usize, metric: &str) -> bool {
        let Some(series) = self.result.daily.get(metric) else {
            warn!(metric, "Unknown metric; ignoring day selection");
            return false;
        };
        if index >= self.markers.len() {
            warn!(
                index,
                days = self.markers.len(),
                "Day index out of range; ignoring day selection"
            );
            return false;
        }

        let description = {
            let date = &self.markers[index].date;
            format_metric_value(metric, date, series.get(date).copied())
        };

        for (i, marker) in self.markers.iter_mut().enumerate() {
            marker.visible = i == index;
        }
        self.markers[index].description = description;
        self.active = index;
        true
    }

    /// Reveals each day in date order, waiting `delay` after every step.
    ///
    /// `on_step` sees the session right after each reveal. Stops early once
    /// `cancel` fires and returns the number of days shown. Taking
    /// `&mut self` keeps two playbacks off the same markers.
    pub async fn play<F>(
        &mut self,
        metric: &str,
        delay: Duration,
        cancel: &CancellationToken,
        mut on_step: F,
    ) -> usize
    where
        F: FnMut(&Self),
    {
        if self.markers.is_empty() {
            warn!("No days loaded; nothing to play");
            return 0;
        }
        if !self.result.daily.contains_key(metric) {
            warn!(metric, "Unknown metric; nothing to play");
            return 0;
        }

        let mut shown = 0;
        for index in 0..self.markers.len() {
            if cancel.is_cancelled() {
                break;
            }
            let selected = self.select_day(index, metric);
            debug_assert!(selected, "index and metric were checked before playing");
            shown += 1;
            on_step(self);

            tokio::select! {
                biased;
                () = cancel.cancelled() => break,
                () = tokio::time::sleep(delay) => {}
            }
        }
        shown
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;
    use crate::models::{ResultMeta, SummaryStatistics};

    fn result_with(days: usize) -> AggregationResult {
        let dates: Vec<String> = (1..=days).map(|d| format!("202301{d:02}")).collect();
        let channel = |offset: f64| -> BTreeMap<String, f64> {
            dates
                .iter()
                .enumerate()
                .map(|(i, date)| (date.clone(), offset + i as f64))
                .collect()
        };
        let daily = [
            ("T2M", channel(10.0)),
            ("T2M_MAX", channel(15.0)),
            ("T2M_MIN", channel(5.0)),
            ("WS50M", channel(6.0)),
            ("WS50M_MAX", channel(9.0)),
            ("WS50M_MIN", channel(2.0)),
        ]
        .into_iter()
        .map(|(code, series)| (code.to_string(), series))
        .collect();

        AggregationResult {
            meta: ResultMeta {
                lat: 29.62,
                lon: -95.63,
                start: "20230101".to_string(),
                end: format!("202301{days:02}"),
                parameters: ["T2M", "T2M_MAX", "T2M_MIN", "WS50M", "WS50M_MAX", "WS50M_MIN"]
                    .iter()
                    .map(ToString::to_string)
                    .collect(),
            },
            daily,
            stats: SummaryStatistics::default(),
        }
    }

    #[test]
    fn new_session_shows_first_day_only() {
        let session = PlaybackSession::new(result_with(3));
        assert_eq!(session.markers().len(), 3);
        assert_eq!(session.active_index(), Some(0));
        let visible: Vec<usize> = session.visible_markers().map(|(i, _)| i).collect();
        assert_eq!(visible, vec![0]);
        assert_eq!(session.markers()[2].date, "20230103");
        assert!(session.markers()[0].description.contains("20230101"));
    }

    #[test]
    fn select_day_moves_visibility() {
        let mut session = PlaybackSession::new(result_with(3));
        assert!(session.select_day(2, "WS50M"));
        assert_eq!(session.active_index(), Some(2));
        let visible: Vec<usize> = session.visible_markers().map(|(i, _)| i).collect();
        assert_eq!(visible, vec![2]);

        let description = &session.markers()[2].description;
        assert!(description.contains("Wind Speed @50m (m/s)"));
        assert!(description.contains("Date: 20230103"));
        assert!(description.contains("Value: 8"));
    }

    #[test]
    fn select_day_ignores_bad_input() {
        let mut session = PlaybackSession::new(result_with(3));
        assert!(session.select_day(1, "T2M"));
        let before = session.markers().to_vec();

        assert!(!session.select_day(3, "T2M"));
        assert!(!session.select_day(0, "NOT_A_METRIC"));

        assert_eq!(session.markers(), before.as_slice());
        assert_eq!(session.active_index(), Some(1));
    }

    #[test]
    fn empty_result_has_no_markers() {
        let mut result = result_with(0);
        result.daily.values_mut().for_each(BTreeMap::clear);
        let mut session = PlaybackSession::new(result);
        assert!(session.markers().is_empty());
        assert_eq!(session.active_index(), None);
        assert!(!session.select_day(0, "T2M"));
    }
}
