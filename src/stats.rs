//! Stat cards: uptime while the bot is active, and period-over-period metric
//! changes.

/// Time the bot has spent active versus total time observed.
///
/// Timestamps are epoch milliseconds; callers pass `now` so the tracker
/// stays deterministic.
#[derive(Debug, Clone)]
pub struct UptimeTracker {
    active: bool,
    active_ms: u64,
    total_ms: u64,
    last_ms: u64,
}

impl UptimeTracker {
    pub fn new(now_ms: u64) -> Self {
        Self {
            active: true,
            active_ms: 0,
            total_ms: 0,
            last_ms: now_ms,
        }
    }

    /// Account for the time since the previous call.
    pub fn tick(&mut self, now_ms: u64) {
        let elapsed = now_ms.saturating_sub(self.last_ms);
        self.total_ms += elapsed;
        if self.active {
            self.active_ms += elapsed;
        }
        self.last_ms = now_ms.max(self.last_ms);
    }

    /// Pause or resume. Time up to `now_ms` is credited to the old state.
    pub fn set_active(&mut self, active: bool, now_ms: u64) {
        self.tick(now_ms);
        self.active = active;
    }

    pub fn toggle(&mut self, now_ms: u64) -> bool {
        self.set_active(!self.active, now_ms);
        self.active
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn status_label(&self) -> &'static str {
        if self.active {
            "Active"
        } else {
            "Paused"
        }
    }

    pub fn uptime_ms(&self) -> u64 {
        self.active_ms
    }

    pub fn total_ms(&self) -> u64 {
        self.total_ms
    }

    /// Share of observed time spent active, in percent, capped at 100.
    pub fn percentage(&self) -> f64 {
        if self.total_ms == 0 {
            return 100.0;
        }
        (self.active_ms as f64 / self.total_ms as f64 * 100.0).min(100.0)
    }
}

/// `"{h}h {m}m {s}s"`
pub fn format_uptime(ms: u64) -> String {
    let total_seconds = ms / 1000;
    let hours = total_seconds / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let seconds = total_seconds % 60;
    format!("{}h {}m {}s", hours, minutes, seconds)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trend {
    Good,
    Bad,
    Flat,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MetricCard {
    pub category: String,
    pub current: f64,
    pub previous: f64,
    pub unit: Option<String>,
    /// Error rates improve when they go down.
    pub lower_is_better: bool,
}

impl MetricCard {
    pub fn new(category: impl Into<String>, current: f64, previous: f64) -> Self {
        let category = category.into();
        let lower_is_better = category == "Error Rate";
        Self {
            category,
            current,
            previous,
            unit: None,
            lower_is_better,
        }
    }

    pub fn with_unit(mut self, unit: impl Into<String>) -> Self {
        self.unit = Some(unit.into());
        self
    }

    pub fn change(&self) -> f64 {
        self.current - self.previous
    }

    pub fn percent_change(&self) -> Option<f64> {
        if self.previous == 0.0 {
            return None;
        }
        Some(self.change() / self.previous * 100.0)
    }

    /// `+12.0%`, `-9.7%`, or `n/a` without a baseline.
    pub fn percent_label(&self) -> String {
        match self.percent_change() {
            Some(pct) if self.change() > 0.0 => format!("+{:.1}%", pct),
            Some(pct) => format!("{:.1}%", pct),
            None => "n/a".to_string(),
        }
    }

    pub fn trend(&self) -> Trend {
        let change = self.change();
        if change == 0.0 {
            Trend::Flat
        } else if (change > 0.0) != self.lower_is_better {
            Trend::Good
        } else {
            Trend::Bad
        }
    }

    pub fn value_label(&self) -> String {
        match &self.unit {
            Some(unit) => format!("{}{}", self.current, unit),
            None => self.current.to_string(),
        }
    }
}
