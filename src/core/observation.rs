//! Observation model: survey times, point identifiers and single measurements.

use std::cmp::Ordering;
use std::fmt;

/// Orderable survey identifier (a year, an ordinal, or a free-text label).
///
/// Numeric variants compare by value, integer against float included. Every
/// numeric value sorts before any text value.
#[derive(Debug, Clone)]
pub enum SurveyTime {
    Integer(i64),
    Float(f64),
    Text(String),
}

/// Point identifier with its original representation preserved.
///
/// Ordering follows the same rules as [`SurveyTime`].
#[derive(Debug, Clone)]
pub enum PointId {
    Integer(i64),
    Float(f64),
    Text(String),
}

/// Field type a geometry layer should use to store a [`PointId`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdKind {
    Short,
    Double,
    Text,
}

impl IdKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            IdKind::Short => "SHORT",
            IdKind::Double => "DOUBLE",
            IdKind::Text => "TEXT",
        }
    }
}

/// Internal view shared by both key types so they order identically.
enum KeyRef<'a> {
    Integer(i64),
    Float(f64),
    Text(&'a str),
}

fn compare_keys(a: KeyRef<'_>, b: KeyRef<'_>) -> Ordering {
    match (a, b) {
        (KeyRef::Integer(a), KeyRef::Integer(b)) => a.cmp(&b),
        (KeyRef::Integer(a), KeyRef::Float(b)) => compare_mixed(a, b),
        (KeyRef::Float(a), KeyRef::Integer(b)) => compare_mixed(b, a).reverse(),
        (KeyRef::Float(a), KeyRef::Float(b)) => a.total_cmp(&b),
        (KeyRef::Text(a), KeyRef::Text(b)) => a.cmp(b),
        (KeyRef::Text(_), _) => Ordering::Greater,
        (_, KeyRef::Text(_)) => Ordering::Less,
    }
}

/// Integer vs float; ties broken so that `1` and `1.0` stay distinct keys.
fn compare_mixed(int: i64, float: f64) -> Ordering {
    (int as f64).total_cmp(&float).then(Ordering::Less)
}

macro_rules! ordered_key {
    ($ty:ident) => {
        impl $ty {
            fn key(&self) -> KeyRef<'_> {
                match self {
                    $ty::Integer(v) => KeyRef::Integer(*v),
                    $ty::Float(v) => KeyRef::Float(*v),
                    $ty::Text(v) => KeyRef::Text(v.as_str()),
                }
            }
        }

        impl PartialEq for $ty {
            fn eq(&self, other: &Self) -> bool {
                self.cmp(other) == Ordering::Equal
            }
        }

        impl Eq for $ty {}

        impl PartialOrd for $ty {
            fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
                Some(self.cmp(other))
            }
        }

        impl Ord for $ty {
            fn cmp(&self, other: &Self) -> Ordering {
                compare_keys(self.key(), other.key())
            }
        }

        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                match self {
                    $ty::Integer(v) => write!(f, "{}", v),
                    // Integral floats keep a `.0` so they re-read as floats
                    $ty::Float(v) if v.is_finite() && v.fract() == 0.0 => write!(f, "{:.1}", v),
                    $ty::Float(v) => write!(f, "{}", v),
                    $ty::Text(v) => f.write_str(v),
                }
            }
        }

        impl From<i64> for $ty {
            fn from(v: i64) -> Self {
                $ty::Integer(v)
            }
        }

        impl From<i32> for $ty {
            fn from(v: i32) -> Self {
                $ty::Integer(i64::from(v))
            }
        }

        impl From<f64> for $ty {
            fn from(v: f64) -> Self {
                $ty::Float(v)
            }
        }

        impl From<&str> for $ty {
            fn from(v: &str) -> Self {
                $ty::Text(v.to_string())
            }
        }

        impl From<String> for $ty {
            fn from(v: String) -> Self {
                $ty::Text(v)
            }
        }
    };
}

ordered_key!(SurveyTime);
ordered_key!(PointId);

impl PointId {
    /// Field type for storing this id in a geometry layer.
    pub fn kind(&self) -> IdKind {
        match self {
            PointId::Integer(_) => IdKind::Short,
            PointId::Float(_) => IdKind::Double,
            PointId::Text(_) => IdKind::Text,
        }
    }
}

/// One measurement of one point at one survey.
#[derive(Debug, Clone, PartialEq)]
pub struct Observation {
    pub time: SurveyTime,
    pub id: PointId,
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Observation {
    pub fn new(
        time: impl Into<SurveyTime>,
        id: impl Into<PointId>,
        x: f64,
        y: f64,
        z: f64,
    ) -> Self {
        Self {
            time: time.into(),
            id: id.into(),
            x,
            y,
            z,
        }
    }

    /// Coordinates as an `[x, y, z]` array.
    #[inline]
    pub fn coords(&self) -> [f64; 3] {
        [self.x, self.y, self.z]
    }

    /// True when every coordinate is a finite number.
    #[inline]
    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }
}

/// All observations of one point, ordered ascending by survey time.
///
/// Built once by grouping and never mutated afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct ObservationGroup {
    id: PointId,
    observations: Vec<Observation>,
}

impl ObservationGroup {
    /// Callers must pass a non-empty, time-ordered sequence sharing `id`.
    pub(crate) fn new(id: PointId, observations: Vec<Observation>) -> Self {
        debug_assert!(!observations.is_empty(), "group must not be empty");
        debug_assert!(observations.iter().all(|o| o.id == id));
        Self { id, observations }
    }

    #[inline]
    pub fn id(&self) -> &PointId {
        &self.id
    }

    #[inline]
    pub fn observations(&self) -> &[Observation] {
        &self.observations
    }

    /// Number of surveys of this point (always at least one).
    #[inline]
    pub fn len(&self) -> usize {
        self.observations.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.observations.is_empty()
    }

    /// Earliest survey.
    pub fn first(&self) -> &Observation {
        &self.observations[0]
    }

    /// Latest survey.
    pub fn last(&self) -> &Observation {
        &self.observations[self.observations.len() - 1]
    }

    /// True when the point was surveyed only once.
    #[inline]
    pub fn is_singleton(&self) -> bool {
        self.observations.len() == 1
    }

    /// Time-ordered `[x, y, z]` path, the vertex list of the movement line.
    pub fn coordinates(&self) -> Vec<[f64; 3]> {
        self.observations.iter().map(Observation::coords).collect()
    }
}

/// Movement of one point between two of its surveys.
///
/// Field order matches the exported table columns.
#[derive(Debug, Clone, PartialEq)]
pub struct MovementRecord {
    pub from_time: SurveyTime,
    pub from_id: PointId,
    pub x1: f64,
    pub y1: f64,
    pub z1: f64,
    pub to_time: SurveyTime,
    pub to_id: PointId,
    pub x2: f64,
    pub y2: f64,
    pub z2: f64,
    /// Planar distance
    pub distance: f64,
    /// Signed elevation change
    pub delta_z: f64,
    /// Bearing in degrees clockwise from north, in [0, 360)
    pub azimuth: f64,
}

impl MovementRecord {
    /// True when both ends share a survey time, as for a point surveyed once.
    pub fn is_degenerate(&self) -> bool {
        self.from_time == self.to_time
    }
}
