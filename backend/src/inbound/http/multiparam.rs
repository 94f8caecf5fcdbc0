//! Multi-parameter form attributes.
//!
//! HTML date pickers post one field per component: `leave_date(1i)=2026`,
//! `leave_date(2i)=5`, `leave_date(3i)=14`, `leave_date(4i)=9`,
//! `leave_date(5i)=30`. This module groups those components per attribute
//! and instantiates the typed value, collecting every failing attribute
//! into a single [`MultiparameterAssignmentErrors`].
//!
//! Key grammar: `name(N<t>)` where `name` contains no `(`, `N >= 1` and the
//! type suffix `t` is `i` (integer) or `f` (float). Other keys are plain
//! fields and pass through untouched; a repeated plain key keeps the last
//! value.

use std::collections::{BTreeMap, HashMap};
use std::fmt;

use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use serde::Serialize;
use serde_json::json;
use utoipa::ToSchema;

use crate::domain::Error;

/// Numeric component parsed from a suffixed key.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Scalar {
    Int(i64),
    Float(f64),
}

impl Scalar {
    fn as_whole(self) -> Option<i64> {
        match self {
            Self::Int(value) => Some(value),
            Self::Float(value) if value.fract() == 0.0 && value.is_finite() => {
                Some(value as i64)
            }
            Self::Float(_) => None,
        }
    }
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(value) => write!(f, "{value}"),
            Self::Float(value) => write!(f, "{value:?}"),
        }
    }
}

/// Type an attribute is instantiated as once its components are known.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetKind {
    /// `year, month, day`.
    Date,
    /// `year, month, day, hour, minute[, second]`, interpreted as UTC.
    DateTime,
    /// The component list itself.
    Raw,
}

/// Value produced for a multi-parameter attribute.
#[derive(Debug, Clone, PartialEq)]
pub enum Coerced {
    Date(NaiveDate),
    DateTime(DateTime<Utc>),
    Raw(Vec<Scalar>),
}

/// Failure to instantiate one attribute.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("error on assignment {values} to {attribute}")]
pub struct AttributeAssignmentError {
    pub attribute: String,
    /// Components as received, e.g. `[2026, 2, 30, nil, nil]`.
    pub values: String,
    pub cause: String,
}

/// Every attribute that failed during one assignment.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{} error(s) on assignment of multiparameter attributes", .errors.len())]
pub struct MultiparameterAssignmentErrors {
    errors: Vec<AttributeAssignmentError>,
}

impl MultiparameterAssignmentErrors {
    pub fn errors(&self) -> &[AttributeAssignmentError] {
        &self.errors
    }
}

/// One entry of `details.errors` in the `400` response.
#[derive(Debug, Serialize, ToSchema)]
pub struct AttributeErrorDetail {
    pub attribute: String,
    pub message: String,
    pub cause: String,
}

impl From<MultiparameterAssignmentErrors> for Error {
    fn from(value: MultiparameterAssignmentErrors) -> Self {
        let summary = value.to_string();
        let errors: Vec<AttributeErrorDetail> = value
            .errors
            .into_iter()
            .map(|err| AttributeErrorDetail {
                message: err.to_string(),
                attribute: err.attribute,
                cause: err.cause,
            })
            .collect();
        Error::invalid_request(summary).with_details(json!({ "errors": errors }))
    }
}

/// Form attributes after multi-parameter coercion.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AssignedAttributes {
    plain: HashMap<String, String>,
    coerced: HashMap<String, Option<Coerced>>,
}

impl AssignedAttributes {
    pub fn plain(&self, name: &str) -> Option<&str> {
        self.plain.get(name).map(String::as_str)
    }

    /// `None` both when the attribute was not posted and when every
    /// component was blank.
    pub fn coerced(&self, name: &str) -> Option<&Coerced> {
        self.coerced.get(name).and_then(Option::as_ref)
    }

    /// Whether any `name(N?)` component was posted.
    pub fn has_components(&self, name: &str) -> bool {
        self.coerced.contains_key(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Suffix {
    Int,
    Float,
}

#[derive(Debug, PartialEq, Eq)]
struct ComponentKey<'a> {
    attribute: &'a str,
    position: u32,
    suffix: Suffix,
}

fn parse_key(key: &str) -> Option<ComponentKey<'_>> {
    let (attribute, rest) = key.split_once('(')?;
    if attribute.is_empty() {
        return None;
    }
    let inner = rest.strip_suffix(')')?;
    let (digits, suffix) = match (inner.strip_suffix('i'), inner.strip_suffix('f')) {
        (Some(digits), _) => (digits, Suffix::Int),
        (None, Some(digits)) => (digits, Suffix::Float),
        (None, None) => return None,
    };
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let position = digits.parse::<u32>().ok().filter(|p| *p >= 1)?;
    Some(ComponentKey {
        attribute,
        position,
        suffix,
    })
}

/// Raw component as posted, before numeric parsing.
#[derive(Debug, Clone)]
enum Component {
    Blank,
    Parsed(Scalar),
    Unparseable(String),
}

impl fmt::Display for Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Blank => f.write_str("nil"),
            Self::Parsed(scalar) => write!(f, "{scalar}"),
            Self::Unparseable(raw) => write!(f, "{raw:?}"),
        }
    }
}

fn parse_component(value: &str, suffix: Suffix) -> Component {
    if value.is_empty() {
        return Component::Blank;
    }
    let trimmed = value.trim();
    let parsed = match suffix {
        Suffix::Int => trimmed.parse::<i64>().ok().map(Scalar::Int),
        Suffix::Float => trimmed
            .parse::<f64>()
            .ok()
            .filter(|v| v.is_finite())
            .map(Scalar::Float),
    };
    parsed.map_or_else(|| Component::Unparseable(value.to_owned()), Component::Parsed)
}

fn render(components: &[Component]) -> String {
    let inner: Vec<String> = components.iter().map(ToString::to_string).collect();
    format!("[{}]", inner.join(", "))
}

/// Group `pairs` and instantiate every multi-parameter attribute.
///
/// `kind_of` names the target type for each attribute.
///
/// # Examples
///
/// ```
/// use icare::inbound::http::multiparam::{Coerced, TargetKind, assign};
///
/// let pairs = vec![
///     ("title".to_owned(), "Ride".to_owned()),
///     ("leave_date(1i)".to_owned(), "2026".to_owned()),
///     ("leave_date(2i)".to_owned(), "5".to_owned()),
///     ("leave_date(3i)".to_owned(), "14".to_owned()),
/// ];
/// let attrs = assign(pairs, |_| TargetKind::Date).expect("valid date");
/// assert_eq!(attrs.plain("title"), Some("Ride"));
/// assert!(matches!(attrs.coerced("leave_date"), Some(Coerced::Date(_))));
/// ```
pub fn assign<I, F>(pairs: I, kind_of: F) -> Result<AssignedAttributes, MultiparameterAssignmentErrors>
where
    I: IntoIterator<Item = (String, String)>,
    F: Fn(&str) -> TargetKind,
{
    let mut plain = HashMap::new();
    let mut order: Vec<String> = Vec::new();
    let mut groups: HashMap<String, BTreeMap<u32, Component>> = HashMap::new();

    for (key, value) in pairs {
        match parse_key(&key) {
            Some(component) => {
                let attribute = component.attribute.to_owned();
                let parsed = parse_component(&value, component.suffix);
                let group = groups.entry(attribute.clone()).or_insert_with(|| {
                    order.push(attribute);
                    BTreeMap::new()
                });
                group.insert(component.position, parsed);
            }
            None => {
                plain.insert(key, value);
            }
        }
    }

    let mut coerced = HashMap::with_capacity(order.len());
    let mut errors = Vec::new();
    for attribute in order {
        let Some(group) = groups.remove(&attribute) else {
            continue;
        };
        let components = spread(group);
        match instantiate(kind_of(&attribute), &components) {
            Ok(value) => {
                coerced.insert(attribute, value);
            }
            Err(cause) => errors.push(AttributeAssignmentError {
                values: render(&components),
                attribute,
                cause,
            }),
        }
    }

    if errors.is_empty() {
        Ok(AssignedAttributes { plain, coerced })
    } else {
        Err(MultiparameterAssignmentErrors { errors })
    }
}

/// Lay components out from the lowest to the highest position seen.
fn spread(mut group: BTreeMap<u32, Component>) -> Vec<Component> {
    let (Some(min), Some(max)) = (
        group.keys().next().copied(),
        group.keys().next_back().copied(),
    ) else {
        return Vec::new();
    };
    (min..=max)
        .map(|position| group.remove(&position).unwrap_or(Component::Blank))
        .collect()
}

fn instantiate(kind: TargetKind, components: &[Component]) -> Result<Option<Coerced>, String> {
    if components.iter().all(|c| matches!(c, Component::Blank)) {
        return Ok(None);
    }
    let values = components
        .iter()
        .map(|component| match component {
            Component::Blank => Ok(Scalar::Int(1)),
            Component::Parsed(scalar) => Ok(*scalar),
            Component::Unparseable(raw) => Err(format!("{raw:?} is not a number")),
        })
        .collect::<Result<Vec<_>, _>>()?;

    match kind {
        TargetKind::Raw => Ok(Some(Coerced::Raw(values))),
        TargetKind::Date => date_from(&values).map(|d| Some(Coerced::Date(d))),
        TargetKind::DateTime => date_time_from(&values).map(|dt| Some(Coerced::DateTime(dt))),
    }
}

fn whole_parts(values: &[Scalar], max: usize) -> Result<Vec<i64>, String> {
    if values.len() > max {
        return Err(format!("expected at most {max} components, got {}", values.len()));
    }
    values
        .iter()
        .map(|v| v.as_whole().ok_or_else(|| format!("{v} is not a whole number")))
        .collect()
}

fn component<T: TryFrom<i64>>(parts: &[i64], index: usize, default: T) -> Result<T, String> {
    match parts.get(index) {
        Some(value) => T::try_from(*value).map_err(|_| format!("{value} is out of range")),
        None => Ok(default),
    }
}

fn date_from(values: &[Scalar]) -> Result<NaiveDate, String> {
    let parts = whole_parts(values, 3)?;
    let year: i32 = component(&parts, 0, 1)?;
    let month: u32 = component(&parts, 1, 1)?;
    let day: u32 = component(&parts, 2, 1)?;
    NaiveDate::from_ymd_opt(year, month, day)
        .ok_or_else(|| format!("{year}-{month}-{day} is not a valid date"))
}

fn date_time_from(values: &[Scalar]) -> Result<DateTime<Utc>, String> {
    let parts = whole_parts(values, 6)?;
    let date = date_from(
        &parts
            .iter()
            .take(3)
            .map(|v| Scalar::Int(*v))
            .collect::<Vec<_>>(),
    )?;
    let hour: u32 = component(&parts, 3, 0)?;
    let minute: u32 = component(&parts, 4, 0)?;
    let second: u32 = component(&parts, 5, 0)?;
    let naive = date
        .and_hms_opt(hour, minute, second)
        .ok_or_else(|| format!("{hour}:{minute}:{second} is not a valid time"))?;
    Ok(Utc.from_utc_datetime(&naive))
}
