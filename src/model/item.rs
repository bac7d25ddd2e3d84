// File: ./src/model/item.rs
// Records as they arrive from the retrieval layer, plus the derived Occurrence
use chrono::NaiveDateTime;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Weekly lesson contract.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Regular {
    #[serde(rename = "ID_Regular", deserialize_with = "loose_text")]
    pub regular_id: String,
    #[serde(rename = "Alumno", default, deserialize_with = "loose_text")]
    pub student: String,
    #[serde(rename = "Tutor", default, deserialize_with = "loose_text")]
    pub tutor: String,
    #[serde(rename = "Curso", default, deserialize_with = "loose_text")]
    pub course: String,
    #[serde(rename = "Modalidad", default, deserialize_with = "loose_text")]
    pub modality: String,
    #[serde(rename = "Dia_Semana", default, deserialize_with = "loose_weekday")]
    pub weekday: Option<WeekdaySpec>,
    #[serde(rename = "Hora_Inicio")]
    pub start_time: String,
    #[serde(rename = "Hora_Final")]
    pub end_time: String,
    #[serde(rename = "Inicio_Contrato")]
    pub contract_start: String,
    #[serde(rename = "Fin_Contrato")]
    pub contract_end: String,
}

/// Cancels the occurrence of `regular_id` that falls on `date`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Exception {
    #[serde(rename = "ID_Regular", deserialize_with = "loose_text")]
    pub regular_id: String,
    #[serde(rename = "Fecha")]
    pub date: String,
}

/// Standalone lesson, not generated by recurrence.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Eventual {
    #[serde(rename = "ID_Evento", deserialize_with = "loose_text")]
    pub event_id: String,
    #[serde(rename = "Alumno", default, deserialize_with = "loose_text")]
    pub student: String,
    #[serde(rename = "Tutor", default, deserialize_with = "loose_text")]
    pub tutor: String,
    #[serde(rename = "Curso", default, deserialize_with = "loose_text")]
    pub course: String,
    #[serde(rename = "Modalidad", default, deserialize_with = "loose_text")]
    pub modality: String,
    #[serde(rename = "Fecha")]
    pub date: String,
    #[serde(rename = "Hora_Inicio")]
    pub start_time: String,
    #[serde(rename = "Hora_Final")]
    pub end_time: String,
}

/// Weekday column as stored: an ISO number or a (Spanish) name.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(untagged)]
pub enum WeekdaySpec {
    Number(i64),
    Text(String),
    /// Anything else (fractional numbers, booleans, arrays). Never resolves.
    Other(Value),
}

impl From<i64> for WeekdaySpec {
    fn from(n: i64) -> Self {
        WeekdaySpec::Number(n)
    }
}

impl From<&str> for WeekdaySpec {
    fn from(s: &str) -> Self {
        WeekdaySpec::Text(s.to_string())
    }
}

/// One dated lesson, ready for a calendar.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Occurrence {
    pub id: String,
    pub title: String,
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
    pub source: OccurrenceSource,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(tag = "kind", content = "record", rename_all = "snake_case")]
pub enum OccurrenceSource {
    Regular(Regular),
    Eventual(Eventual),
}

impl OccurrenceSource {
    pub fn student(&self) -> &str {
        match self {
            Self::Regular(r) => &r.student,
            Self::Eventual(e) => &e.student,
        }
    }

    pub fn tutor(&self) -> &str {
        match self {
            Self::Regular(r) => &r.tutor,
            Self::Eventual(e) => &e.tutor,
        }
    }

    pub fn course(&self) -> &str {
        match self {
            Self::Regular(r) => &r.course,
            Self::Eventual(e) => &e.course,
        }
    }

    pub fn modality(&self) -> &str {
        match self {
            Self::Regular(r) => &r.modality,
            Self::Eventual(e) => &e.modality,
        }
    }
}

pub fn lesson_title(student: &str, course: &str, modality: &str) -> String {
    format!("{} • {} ({})", student, course, modality)
}

/// Ids and labels come out of SQL as strings, numbers or null. Keep them all as text.
fn loose_text<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::Null => Ok(String::new()),
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        Value::Bool(b) => Ok(b.to_string()),
        other => Err(serde::de::Error::custom(format!(
            "expected text or number, found {}",
            other
        ))),
    }
}

/// Integral floats (`3.0`) count as numbers; unusable values are kept for the skip report.
fn loose_weekday<'de, D>(deserializer: D) -> Result<Option<WeekdaySpec>, D::Error>
where
    D: Deserializer<'de>,
{
    let spec = match Value::deserialize(deserializer)? {
        Value::Null => return Ok(None),
        Value::String(s) => WeekdaySpec::Text(s),
        Value::Number(n) => match (n.as_i64(), n.as_f64()) {
            (Some(i), _) => WeekdaySpec::Number(i),
            (None, Some(f)) if f.fract() == 0.0 && f.abs() <= i64::MAX as f64 => {
                WeekdaySpec::Number(f as i64)
            }
            _ => WeekdaySpec::Other(Value::Number(n)),
        },
        other => WeekdaySpec::Other(other),
    };
    Ok(Some(spec))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn regular_decodes_numeric_ids_and_weekdays() {
        let r: Regular = serde_json::from_value(json!({
            "ID_Regular": 17,
            "Alumno": "Ana",
            "Tutor": "Luis",
            "Curso": "Álgebra",
            "Modalidad": "Virtual",
            "Dia_Semana": 3,
            "Hora_Inicio": "09:00:00",
            "Hora_Final": "10:00:00",
            "Inicio_Contrato": "2024-03-01",
            "Fin_Contrato": "2024-03-22"
        }))
        .unwrap();
        assert_eq!(r.regular_id, "17");
        assert_eq!(r.weekday, Some(WeekdaySpec::Number(3)));
    }

    #[test]
    fn regular_decodes_textual_weekday_and_null_labels() {
        let r: Regular = serde_json::from_value(json!({
            "ID_Regular": "R1",
            "Alumno": null,
            "Dia_Semana": "Miércoles",
            "Hora_Inicio": "09:00",
            "Hora_Final": "10:00",
            "Inicio_Contrato": "01/03/2024",
            "Fin_Contrato": "22/03/2024"
        }))
        .unwrap();
        assert_eq!(r.student, "");
        assert_eq!(r.tutor, "");
        assert_eq!(r.weekday, Some(WeekdaySpec::Text("Miércoles".to_string())));
    }

    fn weekday_of(raw: Value) -> Option<WeekdaySpec> {
        let r: Regular = serde_json::from_value(json!({
            "ID_Regular": "R1",
            "Dia_Semana": raw,
            "Hora_Inicio": "09:00",
            "Hora_Final": "10:00",
            "Inicio_Contrato": "2024-03-01",
            "Fin_Contrato": "2024-03-22"
        }))
        .unwrap();
        r.weekday
    }

    #[test]
    fn weekday_column_decodes_whatever_sql_sends() {
        assert_eq!(weekday_of(json!(3.0)), Some(WeekdaySpec::Number(3)));
        assert_eq!(weekday_of(json!(null)), None);
        assert_eq!(weekday_of(json!(2.5)), Some(WeekdaySpec::Other(json!(2.5))));
        assert_eq!(weekday_of(json!(true)), Some(WeekdaySpec::Other(json!(true))));
        assert_eq!(weekday_of(json!([])), Some(WeekdaySpec::Other(json!([]))));
    }

    #[test]
    fn source_record_keeps_wire_labels() {
        let ex = Exception {
            regular_id: "R1".to_string(),
            date: "2024-03-11".to_string(),
        };
        let v = serde_json::to_value(&ex).unwrap();
        assert_eq!(v, json!({"ID_Regular": "R1", "Fecha": "2024-03-11"}));
    }

    #[test]
    fn title_joins_student_course_and_modality() {
        assert_eq!(
            lesson_title("Ana", "Física", "Presencial"),
            "Ana • Física (Presencial)"
        );
    }
}
