//! Numbers and insights derived from a [DailyActivitySet].
//!
//! Insights are plain thresholds over the snapshot. The cutoffs are public so that callers and
//! tests can refer to them instead of repeating the numbers.

use std::{collections::BTreeMap, fmt::Display};

use chrono::{DateTime, Local};
use serde::Serialize;
use tracing::instrument;

use crate::utils::{
    percentage::{count_percentage, Percentage},
    time::hours_between,
};

use super::{
    aggregate::{DailyActivitySet, HOURS_IN_DAY},
    record::{Category, Source},
};

/// Days with at least this many records are very active.
pub const VERY_ACTIVE_MIN_RECORDS: usize = 51;
pub const PRODUCTIVE_MIN_RECORDS: usize = 21;
pub const MODERATE_MIN_RECORDS: usize = 11;

pub const HIGH_PRODUCTIVITY_PERCENT: f64 = 70.;
pub const BALANCED_PRODUCTIVITY_PERCENT: f64 = 40.;

/// Active spans strictly longer than this are long.
pub const LONG_SPAN_HOURS: f64 = 12.;
/// Active spans strictly longer than this are a full day.
pub const FULL_DAY_SPAN_HOURS: f64 = 8.;

pub const HEAVY_AI_MIN_CHATS: usize = 4;
pub const WORK_INTENSIVE_MIN_RECORDS: usize = 11;

/// Peak hours before this are mornings.
pub const MORNING_END_HOUR: u32 = 12;
/// Peak hours before this (and after the morning) are afternoons.
pub const AFTERNOON_END_HOUR: u32 = 17;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Insight {
    VeryActiveDay { total: usize },
    ProductiveDay { total: usize },
    ModerateActivity { total: usize },
    LightDay { total: usize },
    HighProductivityFocus { productivity: Percentage },
    BalancedDay { productivity: Percentage },
    RelaxedDay { productivity: Percentage },
    LongActivePeriod { hours: f64 },
    FullDay { hours: f64 },
    FocusedSession { hours: f64 },
    HeavyAiAssistance { chats: usize },
    LearningFocused,
    WorkIntensive { work: usize },
    MorningPerson { hour: u32 },
    AfternoonFocus { hour: u32 },
    EveningActive { hour: u32 },
}

impl Display for Insight {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Insight::VeryActiveDay { total } => {
                write!(f, "Very active day with {total} logged activities")
            }
            Insight::ProductiveDay { total } => write!(f, "Productive day with {total} activities"),
            Insight::ModerateActivity { total } => {
                write!(f, "Moderate activity with {total} logged events")
            }
            Insight::LightDay { total } => write!(f, "Light day with {total} activities"),
            Insight::HighProductivityFocus { productivity } => {
                write!(f, "High productivity focus ({productivity} work/learning)")
            }
            Insight::BalancedDay { productivity } => {
                write!(f, "Balanced day ({productivity} work/learning)")
            }
            Insight::RelaxedDay { productivity } => {
                write!(f, "Relaxed day ({productivity} work/learning)")
            }
            Insight::LongActivePeriod { hours } => {
                write!(f, "Long active period ({hours:.1} hours)")
            }
            Insight::FullDay { hours } => write!(f, "Full day of activity ({hours:.1} hours)"),
            Insight::FocusedSession { hours } => write!(f, "Focused session ({hours:.1} hours)"),
            Insight::HeavyAiAssistance { chats } => {
                write!(f, "Heavy AI assistance day ({chats} conversations)")
            }
            Insight::LearningFocused => write!(f, "Learning-focused day"),
            Insight::WorkIntensive { work } => write!(f, "Work-intensive day ({work} activities)"),
            Insight::MorningPerson { hour } => {
                write!(f, "Morning person, peak activity at {hour}:00")
            }
            Insight::AfternoonFocus { hour } => {
                write!(f, "Afternoon focus, peak activity at {hour}:00")
            }
            Insight::EveningActive { hour } => {
                write!(f, "Evening active, peak activity at {hour}:00")
            }
        }
    }
}

/// Read only summary of a [DailyActivitySet]. Recomputed from the set, never edited.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatisticsSnapshot {
    pub total: usize,
    pub productivity: Percentage,
    pub by_category: BTreeMap<Category, usize>,
    pub by_source: BTreeMap<Source, usize>,
    pub hourly: [usize; HOURS_IN_DAY],
    /// `None` for an empty day.
    pub peak_hour: Option<u32>,
    pub first_activity: Option<DateTime<Local>>,
    pub last_activity: Option<DateTime<Local>>,
    pub active_span_hours: f64,
    pub insights: Vec<Insight>,
}

#[instrument(skip(set), fields(day = %set.day()))]
pub fn compute(set: &DailyActivitySet) -> StatisticsSnapshot {
    let total = set.len();
    let by_category = set
        .by_category()
        .iter()
        .map(|(category, records)| (*category, records.len()))
        .collect::<BTreeMap<_, _>>();

    let productive = by_category
        .iter()
        .filter(|(category, _)| category.is_productive())
        .map(|(_, count)| count)
        .sum();
    let productivity = count_percentage(productive, total);

    let hourly = *set.hourly();
    let peak_hour = peak_hour(&hourly);

    let first_activity = set.activities().first().map(|v| v.timestamp());
    let last_activity = set.activities().last().map(|v| v.timestamp());
    let active_span_hours = match (first_activity, last_activity) {
        (Some(first), Some(last)) if total >= 2 => hours_between(&first, &last),
        _ => 0.,
    };

    let mut snapshot = StatisticsSnapshot {
        total,
        productivity,
        by_category,
        by_source: set.by_source().clone(),
        hourly,
        peak_hour,
        first_activity,
        last_activity,
        active_span_hours,
        insights: vec![],
    };
    snapshot.insights = insights(&snapshot);
    snapshot
}

/// Busiest hour, the earliest one on ties.
fn peak_hour(hourly: &[usize; HOURS_IN_DAY]) -> Option<u32> {
    let mut peak: Option<(u32, usize)> = None;
    for (hour, count) in hourly.iter().copied().enumerate() {
        if count == 0 {
            continue;
        }
        match peak {
            Some((_, best)) if best >= count => {}
            _ => peak = Some((hour as u32, count)),
        }
    }
    peak.map(|(hour, _)| hour)
}

fn insights(snapshot: &StatisticsSnapshot) -> Vec<Insight> {
    let total = snapshot.total;
    if total == 0 {
        return vec![];
    }
    let mut insights = vec![];

    insights.push(if total >= VERY_ACTIVE_MIN_RECORDS {
        Insight::VeryActiveDay { total }
    } else if total >= PRODUCTIVE_MIN_RECORDS {
        Insight::ProductiveDay { total }
    } else if total >= MODERATE_MIN_RECORDS {
        Insight::ModerateActivity { total }
    } else {
        Insight::LightDay { total }
    });

    let productivity = snapshot.productivity;
    insights.push(if *productivity >= HIGH_PRODUCTIVITY_PERCENT {
        Insight::HighProductivityFocus { productivity }
    } else if *productivity >= BALANCED_PRODUCTIVITY_PERCENT {
        Insight::BalancedDay { productivity }
    } else {
        Insight::RelaxedDay { productivity }
    });

    let hours = snapshot.active_span_hours;
    insights.push(if hours > LONG_SPAN_HOURS {
        Insight::LongActivePeriod { hours }
    } else if hours > FULL_DAY_SPAN_HOURS {
        Insight::FullDay { hours }
    } else {
        Insight::FocusedSession { hours }
    });

    let chats = snapshot.by_source.get(&Source::AiChat).copied().unwrap_or(0);
    if chats >= HEAVY_AI_MIN_CHATS {
        insights.push(Insight::HeavyAiAssistance { chats });
    }

    let count = |category: Category| snapshot.by_category.get(&category).copied().unwrap_or(0);
    let work = count(Category::Work);
    if count(Category::Learning) > work {
        insights.push(Insight::LearningFocused);
    }
    if work >= WORK_INTENSIVE_MIN_RECORDS {
        insights.push(Insight::WorkIntensive { work });
    }

    if let Some(hour) = snapshot.peak_hour {
        insights.push(if hour < MORNING_END_HOUR {
            Insight::MorningPerson { hour }
        } else if hour < AFTERNOON_END_HOUR {
            Insight::AfternoonFocus { hour }
        } else {
            Insight::EveningActive { hour }
        });
    }

    insights
}

#[cfg(test)]
mod statistics_tests {
    use chrono::{DateTime, Duration, Local, NaiveDate, NaiveDateTime, NaiveTime, TimeZone};

    use crate::engine::{
        aggregate::aggregate,
        record::{ActivityRecord, Category, IdentityKey, Source},
    };

    use super::{
        compute, peak_hour, Insight, StatisticsSnapshot, HEAVY_AI_MIN_CHATS,
        HIGH_PRODUCTIVITY_PERCENT, MODERATE_MIN_RECORDS,
    };

    const TEST_DATE: NaiveDate = NaiveDate::from_ymd_opt(2024, 4, 5).unwrap();

    fn at(hour: u32, minute: u32) -> DateTime<Local> {
        Local
            .from_local_datetime(&NaiveDateTime::new(
                TEST_DATE,
                NaiveTime::from_hms_opt(hour, minute, 0).unwrap(),
            ))
            .unwrap()
    }

    fn record(source: Source, time: DateTime<Local>, category: Category) -> ActivityRecord {
        ActivityRecord::new(source, time, "activity", IdentityKey::unknown()).with_category(category)
    }

    fn snapshot(records: Vec<ActivityRecord>) -> StatisticsSnapshot {
        compute(&aggregate(TEST_DATE, records).unwrap())
    }

    #[test]
    fn productivity_counts_work_and_learning() {
        let mut records = vec![];
        for i in 0..4 {
            records.push(record(Source::Browser, at(9, i), Category::Work));
        }
        for i in 0..2 {
            records.push(record(Source::Browser, at(10, i), Category::Learning));
        }
        for i in 0..2 {
            records.push(record(Source::Browser, at(11, i), Category::Entertainment));
        }

        let stats = snapshot(records);
        assert_eq!(stats.total, 8);
        assert_eq!(*stats.productivity, 75.);
        assert!(stats.insights.contains(&Insight::HighProductivityFocus {
            productivity: stats.productivity
        }));
        assert!(*stats.productivity >= HIGH_PRODUCTIVITY_PERCENT);
    }

    #[test]
    fn peak_hour_ties_go_to_the_earliest() {
        let mut records = vec![];
        for hour in [14, 9, 14, 9, 14, 9, 11, 11, 20] {
            records.push(record(Source::Git, at(hour, 0), Category::Work));
        }
        let stats = snapshot(records);
        assert_eq!(stats.hourly[9], 3);
        assert_eq!(stats.hourly[14], 3);
        assert_eq!(stats.peak_hour, Some(9));
        assert!(stats.insights.contains(&Insight::MorningPerson { hour: 9 }));
    }

    #[test]
    fn peak_hour_of_empty_buckets_is_none() {
        assert_eq!(peak_hour(&[0; 24]), None);
        let mut hourly = [0; 24];
        hourly[23] = 1;
        assert_eq!(peak_hour(&hourly), Some(23));
    }

    #[test]
    fn empty_day_has_zeroes() {
        let stats = snapshot(vec![]);
        assert_eq!(stats.total, 0);
        assert_eq!(*stats.productivity, 0.);
        assert_eq!(stats.active_span_hours, 0.);
        assert_eq!(stats.peak_hour, None);
        assert!(stats.insights.is_empty());
    }

    #[test]
    fn active_span_is_fractional_hours() {
        let stats = snapshot(vec![
            record(Source::Browser, at(8, 15), Category::Work),
            record(Source::Browser, at(10, 45), Category::General),
            record(Source::Browser, at(9, 0), Category::General),
        ]);
        assert_eq!(stats.active_span_hours, 2.5);
        assert_eq!(stats.first_activity, Some(at(8, 15)));
        assert_eq!(stats.last_activity, Some(at(10, 45)));
        assert!(stats
            .insights
            .contains(&Insight::FocusedSession { hours: 2.5 }));
    }

    #[test]
    fn single_record_has_no_span() {
        let stats = snapshot(vec![record(Source::Manual, at(13, 0), Category::Work)
            .with_duration(Duration::hours(3))
            .unwrap()]);
        assert_eq!(stats.active_span_hours, 0.);
        assert!(stats.insights.contains(&Insight::AfternoonFocus { hour: 13 }));
    }

    #[test]
    fn volume_and_source_insights() {
        let mut records = vec![];
        for i in 0..HEAVY_AI_MIN_CHATS as u32 {
            records.push(record(Source::AiChat, at(19, i), Category::Learning));
        }
        for i in 0..(MODERATE_MIN_RECORDS as u32 - HEAVY_AI_MIN_CHATS as u32) {
            records.push(record(Source::Browser, at(8, i), Category::Entertainment));
        }
        let stats = snapshot(records);

        assert!(stats.insights.contains(&Insight::ModerateActivity {
            total: MODERATE_MIN_RECORDS
        }));
        assert!(stats.insights.contains(&Insight::HeavyAiAssistance {
            chats: HEAVY_AI_MIN_CHATS
        }));
        assert!(stats.insights.contains(&Insight::LearningFocused));
        assert!(stats.insights.contains(&Insight::MorningPerson { hour: 8 }));
    }

    #[test]
    fn low_productivity_is_relaxed() {
        let stats = snapshot(vec![
            record(Source::Browser, at(21, 0), Category::Entertainment),
            record(Source::Browser, at(21, 30), Category::General),
        ]);
        assert!(matches!(
            stats.insights.as_slice(),
            [
                Insight::LightDay { total: 2 },
                Insight::RelaxedDay { .. },
                Insight::FocusedSession { .. },
                Insight::EveningActive { hour: 21 },
            ]
        ));
    }
}
