//! A named group of series plus its subscriber registry.

use crate::series::Series;
use crate::subscriptions::{Subscriber, SubscriberId};
use crate::types::{GameData, Timestamp};
use std::collections::HashMap;

/// Series keep first-append order so snapshots list them stably.
pub(crate) struct Game {
    name: String,
    series: Vec<Series>,
    /// Subscribers by series name. A name may be subscribed before it has data.
    subscribers: HashMap<String, HashMap<SubscriberId, Subscriber>>,
}

impl Game {
    pub(crate) fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            series: Vec::new(),
            subscribers: HashMap::new(),
        }
    }

    pub(crate) fn name(&self) -> &str {
        &self.name
    }

    /// The named series, created empty if absent.
    pub(crate) fn series_mut(&mut self, name: &str) -> &mut Series {
        let index = match self.series.iter().position(|s| s.name() == name) {
            Some(index) => index,
            None => {
                self.series.push(Series::new(name));
                self.series.len() - 1
            }
        };
        &mut self.series[index]
    }

    /// Trim every series. Returns the total evicted.
    pub(crate) fn evict_all_before(&mut self, cutoff: Timestamp) -> usize {
        self.series.iter_mut().map(|s| s.evict_before(cutoff)).sum()
    }

    pub(crate) fn snapshot(&self) -> GameData {
        GameData {
            series: self.series.iter().map(Series::snapshot).collect(),
        }
    }

    pub(crate) fn subscriber(&self, series: &str, id: SubscriberId) -> Option<&Subscriber> {
        self.subscribers.get(series)?.get(&id)
    }

    pub(crate) fn add_subscriber(&mut self, series: &str, id: SubscriberId, subscriber: Subscriber) {
        self.subscribers
            .entry(series.to_string())
            .or_default()
            .insert(id, subscriber);
    }

    /// Remove one subscriber, dropping the series key once it has none left.
    pub(crate) fn remove_subscriber(&mut self, series: &str, id: SubscriberId) -> bool {
        let Some(set) = self.subscribers.get_mut(series) else {
            return false;
        };
        let removed = set.remove(&id).is_some();
        if set.is_empty() {
            self.subscribers.remove(series);
        }
        removed
    }

    pub(crate) fn subscribers_of(
        &self,
        series: &str,
    ) -> impl Iterator<Item = (&SubscriberId, &Subscriber)> {
        self.subscribers.get(series).into_iter().flatten()
    }

    pub(crate) fn subscriber_count(&self, series: &str) -> usize {
        self.subscribers.get(series).map_or(0, HashMap::len)
    }
}
