// File: ./src/expand.rs
// Recurring contracts and one-off lessons -> flat list of occurrences
use crate::error::Result;
use crate::model::item::lesson_title;
use crate::model::parser::{combine_local, compact_date, parse_local_date};
use crate::model::{
    Eventual, Exception, Occurrence, OccurrenceSource, Regular, UnresolvedWeekday,
    WeekdayResolution, resolve_weekday,
};
use chrono::{Datelike, Duration, NaiveDate, Weekday};
use serde::Serialize;
use std::collections::HashSet;
use std::iter;

/// Cancelled (schedule, date) pairs.
#[derive(Debug, Default, Clone)]
pub struct ExceptionKeys(HashSet<(String, NaiveDate)>);

impl ExceptionKeys {
    /// Dates are normalized first, so either accepted date shape cancels the same lesson.
    pub fn from_exceptions(exceptions: &[Exception]) -> Result<Self> {
        let mut keys = Self::default();
        for ex in exceptions {
            keys.insert(&ex.regular_id, parse_local_date(&ex.date)?);
        }
        Ok(keys)
    }

    pub fn insert(&mut self, regular_id: &str, date: NaiveDate) {
        self.0.insert((regular_id.to_string(), date));
    }

    pub fn contains(&self, regular_id: &str, date: NaiveDate) -> bool {
        self.0.contains(&(regular_id.to_string(), date))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// A schedule dropped because its weekday could not be resolved.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SkippedSchedule {
    pub regular_id: String,
    pub student: String,
    pub reason: UnresolvedWeekday,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expansion {
    Occurrences(Vec<Occurrence>),
    Skipped(SkippedSchedule),
}

impl Expansion {
    pub fn into_occurrences(self) -> Vec<Occurrence> {
        match self {
            Expansion::Occurrences(occs) => occs,
            Expansion::Skipped(_) => vec![],
        }
    }
}

#[derive(Debug, Default, Clone)]
pub struct RegularExpansion {
    pub occurrences: Vec<Occurrence>,
    pub skipped: Vec<SkippedSchedule>,
}

/// Every non-cancelled weekly occurrence of `schedule` inside its contract interval.
///
/// An unresolvable weekday is not an error: the schedule comes back as [`Expansion::Skipped`].
/// Unparsable contract dates or times are.
pub fn expand(schedule: &Regular, exceptions: &ExceptionKeys) -> Result<Expansion> {
    let weekday = match resolve_weekday(schedule.weekday.as_ref()) {
        WeekdayResolution::Resolved(w) => w.to_chrono(),
        WeekdayResolution::Unresolved(reason) => {
            return Ok(Expansion::Skipped(SkippedSchedule {
                regular_id: schedule.regular_id.clone(),
                student: schedule.student.clone(),
                reason,
            }));
        }
    };

    let contract_start = parse_local_date(&schedule.contract_start)?;
    let contract_end = parse_local_date(&schedule.contract_end)?;

    let Some(first) = first_on_weekday(contract_start, weekday, contract_end) else {
        return Ok(Expansion::Occurrences(vec![]));
    };

    let title = lesson_title(&schedule.student, &schedule.course, &schedule.modality);
    let mut occurrences = Vec::new();

    for day in weekly_from(first, contract_end) {
        if exceptions.contains(&schedule.regular_id, day) {
            continue;
        }
        occurrences.push(Occurrence {
            id: format!(
                "{}-{}-{}",
                schedule.regular_id,
                compact_date(day),
                schedule.start_time
            ),
            title: title.clone(),
            start: combine_local(day, &schedule.start_time)?,
            end: combine_local(day, &schedule.end_time)?,
            source: OccurrenceSource::Regular(schedule.clone()),
        });
    }
    Ok(Expansion::Occurrences(occurrences))
}

/// One pass over all schedules. The first malformed date aborts the batch.
pub fn expand_regulars(schedules: &[Regular], exceptions: &[Exception]) -> Result<RegularExpansion> {
    let keys = ExceptionKeys::from_exceptions(exceptions)?;
    let mut result = RegularExpansion::default();

    for schedule in schedules {
        match expand(schedule, &keys)? {
            Expansion::Occurrences(mut occs) => {
                tracing::debug!(
                    regular_id = %schedule.regular_id,
                    count = occs.len(),
                    "expanded schedule"
                );
                result.occurrences.append(&mut occs);
            }
            Expansion::Skipped(skipped) => {
                tracing::warn!(
                    regular_id = %skipped.regular_id,
                    student = %skipped.student,
                    "skipping schedule: {}",
                    skipped.reason
                );
                result.skipped.push(skipped);
            }
        }
    }
    Ok(result)
}

/// One-off lessons map 1:1, keeping their own ids.
pub fn adapt(events: &[Eventual]) -> Result<Vec<Occurrence>> {
    events
        .iter()
        .map(|ev| {
            let day = parse_local_date(&ev.date)?;
            Ok(Occurrence {
                id: ev.event_id.clone(),
                title: lesson_title(&ev.student, &ev.course, &ev.modality),
                start: combine_local(day, &ev.start_time)?,
                end: combine_local(day, &ev.end_time)?,
                source: OccurrenceSource::Eventual(ev.clone()),
            })
        })
        .collect()
}

fn first_on_weekday(start: NaiveDate, weekday: Weekday, end: NaiveDate) -> Option<NaiveDate> {
    let mut day = start;
    while day.weekday() != weekday {
        day = day.succ_opt()?;
        if day > end {
            return None;
        }
    }
    (day <= end).then_some(day)
}

fn weekly_from(first: NaiveDate, end: NaiveDate) -> impl Iterator<Item = NaiveDate> {
    iter::successors(Some(first), |d| d.checked_add_signed(Duration::weeks(1)))
        .take_while(move |d| *d <= end)
}
