// File: ./src/model/adapter.rs
// Handles ICS serialization of occurrences
use crate::model::item::Occurrence;
use chrono::Utc;
use icalendar::{Calendar, Component, Event, EventLike};

pub const CALENDAR_NAME: &str = "Tutorías";

impl Occurrence {
    pub fn to_event(&self) -> Event {
        let mut event = Event::new();
        event.uid(&self.id);
        event.summary(&self.title);
        event.timestamp(Utc::now());
        // Floating times: the lesson happens at this wall-clock time wherever the reader is
        event.starts(self.start);
        event.ends(self.end);

        let description = format!(
            "Alumno: {}\nTutor: {}\nCurso: {}\nModalidad: {}",
            self.source.student(),
            self.source.tutor(),
            self.source.course(),
            self.source.modality()
        );
        event.description(&description);

        if !self.source.modality().is_empty() {
            event.add_property("CATEGORIES", self.source.modality());
        }
        event.done()
    }
}

pub fn to_ics(occurrences: &[Occurrence]) -> String {
    let mut calendar = Calendar::new();
    calendar.name(CALENDAR_NAME);
    for occ in occurrences {
        calendar.push(occ.to_event());
    }
    calendar.done().to_string()
}
