use serde::{Deserialize, Serialize};

/// Latest published index row.
///
/// Persisted as `{"latest_date", "latest_signal", "latest_signal_score"}`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexSnapshot {
    #[serde(rename = "latest_date")]
    pub date: String,
    #[serde(rename = "latest_signal")]
    pub signal: String,
    #[serde(rename = "latest_signal_score")]
    pub score: i64,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Trend {
    Up,
    Down,
    None,
}

impl Trend {
    pub fn between(previous: Option<&IndexSnapshot>, current: &IndexSnapshot) -> Self {
        match previous {
            Some(p) if current.score > p.score => Trend::Up,
            Some(p) if current.score < p.score => Trend::Down,
            _ => Trend::None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Trend::Up => "up",
            Trend::Down => "down",
            Trend::None => "none",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChangeEvent {
    pub previous: Option<IndexSnapshot>,
    pub current: IndexSnapshot,
    pub trend: Trend,
}

impl ChangeEvent {
    pub fn message(&self) -> String {
        let c = &self.current;
        let mut text = format!(
            "Index updated: date={} signal={} score={}",
            c.date, c.signal, c.score
        );
        match &self.previous {
            Some(p) => text.push_str(&format!(
                " (previous: date={} signal={} score={})",
                p.date, p.signal, p.score
            )),
            None => text.push_str(" (no previous value)"),
        }
        text.push_str(&format!(" trend={}", self.trend.label()));
        text
    }
}

/// `None` when `current` equals `previous` field for field.
pub fn detect_change(previous: Option<&IndexSnapshot>, current: &IndexSnapshot) -> Option<ChangeEvent> {
    if previous == Some(current) {
        return None;
    }
    Some(ChangeEvent {
        previous: previous.cloned(),
        current: current.clone(),
        trend: Trend::between(previous, current),
    })
}

/// Markdown block suitable for appending to a job summary file.
pub fn render_summary(snapshot: &IndexSnapshot) -> String {
    format!(
        "\n## Index Summary\n- **Latest Date**: {}\n- **Latest Signal**: {}\n- **Latest Signal Score**: {}\n",
        snapshot.date, snapshot.signal, snapshot.score
    )
}
