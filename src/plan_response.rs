//! Generated plan responses
//!
//! The generation service replies with an untyped JSON document. It is
//! accepted or rejected by [`validate`] and then narrowed by [`normalize`]
//! into a [`NormalizedPlanResponse`]: all seven weekdays present, lower-case
//! keys, integer sets/reps/ids. Nothing past this module sees the raw
//! document.

use std::collections::BTreeMap;
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use crate::models::Weekday;

/// Day value meaning "no training scheduled"
pub const REST_MARKER: &str = "Rest day";

/// Reps used when a reps value carries no digits at all ("AMRAP")
pub const DEFAULT_REPS: i64 = 10;

/// ---------------------------------------------------------------------------
/// Raw Response
/// ---------------------------------------------------------------------------

/// Weekday name (any case) to either the rest marker or a workout object.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RawPlanResponse(pub Map<String, Value>);

impl RawPlanResponse {
  /// Parse a service payload. Anything but a JSON object is rejected.
  pub fn parse(payload: &str) -> Result<Self, String> {
    match serde_json::from_str::<Value>(payload) {
      Ok(Value::Object(map)) => Ok(Self(map)),
      Ok(other) => Err(format!("expected a JSON object, got {}", json_kind(&other))),
      Err(e) => Err(format!("invalid JSON: {}", e)),
    }
  }
}

fn json_kind(v: &Value) -> &'static str {
  match v {
    Value::Null => "null",
    Value::Bool(_) => "a boolean",
    Value::Number(_) => "a number",
    Value::String(_) => "a string",
    Value::Array(_) => "an array",
    Value::Object(_) => "an object",
  }
}

/// ---------------------------------------------------------------------------
/// Validation
/// ---------------------------------------------------------------------------

/// Accept the response if at least one requested training day holds an
/// object with a non-empty `exercises` array.
///
/// Day keys are matched lower-case or capitalized ("monday" / "Monday").
/// This only guards against empty or garbage replies; coercion of the
/// individual fields is left to [`normalize`].
pub fn validate(raw: &RawPlanResponse, training_days: &[Weekday]) -> bool {
  training_days.iter().any(|day| {
    [day.as_str().to_string(), day.capitalized()]
      .iter()
      .filter_map(|key| raw.0.get(key))
      .any(|value| {
        value
          .get("exercises")
          .and_then(Value::as_array)
          .is_some_and(|exercises| !exercises.is_empty())
      })
  })
}

/// ---------------------------------------------------------------------------
/// Normalized Response
/// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlannedExercise {
  pub exercise_id: i64,
  pub sets: i64,
  pub reps: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum DayPlan {
  Rest,
  Workout {
    main_focus: String,
    exercises: Vec<PlannedExercise>,
  },
}

impl DayPlan {
  pub fn is_rest(&self) -> bool {
    matches!(self, DayPlan::Rest)
  }

  pub fn exercises(&self) -> &[PlannedExercise] {
    match self {
      DayPlan::Rest => &[],
      DayPlan::Workout { exercises, .. } => exercises,
    }
  }
}

/// A plan response with exactly the seven canonical weekdays.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedPlanResponse {
  days: BTreeMap<Weekday, DayPlan>,
}

impl NormalizedPlanResponse {
  pub fn day(&self, day: Weekday) -> &DayPlan {
    // Construction fills every weekday
    &self.days[&day]
  }

  /// Days in week order, Monday first.
  pub fn iter(&self) -> impl Iterator<Item = (Weekday, &DayPlan)> {
    self.days.iter().map(|(d, p)| (*d, p))
  }

  pub fn keys(&self) -> Vec<&'static str> {
    self.days.keys().map(|d| d.as_str()).collect()
  }

  /// Render back to the wire shape (lower-case keys, camelCase fields).
  pub fn to_raw(&self) -> RawPlanResponse {
    let map = self
      .days
      .iter()
      .map(|(day, plan)| {
        let value = match plan {
          DayPlan::Rest => Value::String(REST_MARKER.to_string()),
          DayPlan::Workout { main_focus, exercises } => json!({
            "mainFocus": main_focus,
            "exercises": exercises,
          }),
        };
        (day.as_str().to_string(), value)
      })
      .collect();
    RawPlanResponse(map)
  }
}

/// ---------------------------------------------------------------------------
/// Normalization
/// ---------------------------------------------------------------------------

/// Coerce a raw response into canonical form.
///
/// - keys are lower-cased; keys that are not weekdays are dropped
/// - missing weekdays become rest days, as does any value that is not an
///   object carrying an `exercises` array
/// - `sets` and `exerciseId` (or `exercise_id`) are coerced to integers
/// - `reps` is cast when numeric, otherwise the first run of digits is used,
///   falling back to [`DEFAULT_REPS`]
pub fn normalize(raw: &RawPlanResponse) -> NormalizedPlanResponse {
  let mut lowered: BTreeMap<String, &Value> = BTreeMap::new();
  for (key, value) in &raw.0 {
    lowered.insert(key.to_lowercase(), value);
  }

  let days = Weekday::ALL
    .into_iter()
    .map(|day| {
      let plan = lowered.get(day.as_str()).map_or(DayPlan::Rest, |v| normalize_day(v));
      (day, plan)
    })
    .collect();

  NormalizedPlanResponse { days }
}

fn normalize_day(value: &Value) -> DayPlan {
  let Some(obj) = value.as_object() else {
    return DayPlan::Rest;
  };
  let Some(entries) = obj.get("exercises").and_then(Value::as_array) else {
    return DayPlan::Rest;
  };

  let main_focus = obj
    .get("mainFocus")
    .or_else(|| obj.get("main_focus"))
    .and_then(Value::as_str)
    .unwrap_or_default()
    .to_string();

  let exercises = entries
    .iter()
    .filter_map(Value::as_object)
    .map(|entry| PlannedExercise {
      exercise_id: coerce_int(entry.get("exerciseId").or_else(|| entry.get("exercise_id"))),
      sets: coerce_int(entry.get("sets")),
      reps: coerce_reps(entry.get("reps")),
    })
    .collect();

  DayPlan::Workout { main_focus, exercises }
}

/// Integer cast: numbers truncate, strings use their leading integer,
/// anything else is 0.
fn coerce_int(value: Option<&Value>) -> i64 {
  match value {
    Some(Value::Number(n)) => number_to_int(n),
    Some(Value::String(s)) => leading_int(s).unwrap_or(0),
    Some(Value::Bool(b)) => i64::from(*b),
    _ => 0,
  }
}

fn coerce_reps(value: Option<&Value>) -> i64 {
  match value {
    Some(Value::Number(n)) => number_to_int(n),
    Some(Value::String(s)) => match s.trim().parse::<f64>() {
      Ok(f) if f.is_finite() => f as i64,
      _ => first_digits(s).unwrap_or(DEFAULT_REPS),
    },
    _ => DEFAULT_REPS,
  }
}

fn number_to_int(n: &serde_json::Number) -> i64 {
  n.as_i64().unwrap_or_else(|| n.as_f64().map(|f| f as i64).unwrap_or(0))
}

fn leading_int(s: &str) -> Option<i64> {
  let t = s.trim_start();
  let end = t
    .char_indices()
    .take_while(|(i, c)| c.is_ascii_digit() || (*i == 0 && (*c == '-' || *c == '+')))
    .map(|(i, c)| i + c.len_utf8())
    .last()?;
  t[..end].parse().ok()
}

fn first_digits(s: &str) -> Option<i64> {
  static DIGITS: OnceLock<Option<Regex>> = OnceLock::new();
  let re = DIGITS.get_or_init(|| Regex::new(r"\d+").ok()).as_ref()?;
  re.find(s).and_then(|m| m.as_str().parse().ok())
}

/// ---------------------------------------------------------------------------
/// Tests
/// ---------------------------------------------------------------------------
