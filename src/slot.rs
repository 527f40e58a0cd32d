use std::fmt::{Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use strum::{Display as StrumDisplay, EnumString, VariantArray};

/// Separator between the time and the instructor in a slot descriptor, e.g. `TR 12-1pm with Lili Wilson`.
const DESCRIPTOR_SEPARATOR: &str = " with ";

/// A descriptor which could not be split into a time and an instructor.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("slot descriptor {descriptor:?} is not of the form \"<time> with <instructor>\"")]
pub struct ParseSlotError {
    /// The offending descriptor, as given.
    pub descriptor: String,
}

/// One meeting of a given type: an instructor teaching at a time.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Slot {
    /// Meeting time, e.g. `TR 12-1pm`.
    pub time: String,
    /// Instructor name.
    pub instructor: String,
}

impl Slot {
    /// Construct a slot from its parts, trimming surrounding whitespace.
    pub fn new(time: impl AsRef<str>, instructor: impl AsRef<str>) -> Self {
        Self {
            time: time.as_ref().trim().to_owned(),
            instructor: instructor.as_ref().trim().to_owned(),
        }
    }
}

impl FromStr for Slot {
    type Err = ParseSlotError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.split_once(DESCRIPTOR_SEPARATOR) {
            Some((time, instructor)) if !time.trim().is_empty() && !instructor.trim().is_empty() => {
                Ok(Self::new(time, instructor))
            }
            _ => Err(ParseSlotError { descriptor: s.to_owned() }),
        }
    }
}

impl TryFrom<String> for Slot {
    type Error = ParseSlotError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Slot> for String {
    fn from(value: Slot) -> Self {
        value.to_string()
    }
}

impl Display for Slot {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}{}{}", self.time, DESCRIPTOR_SEPARATOR, self.instructor)
    }
}

/// Which half of a [`SlotPair`] an operation looks at.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, StrumDisplay, EnumString, VariantArray, Serialize, Deserialize)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
#[serde(rename_all = "lowercase")]
pub enum Axis {
    /// The recitation half.
    Recitation,
    /// The tutorial half.
    Tutorial,
}

/// The recitation and tutorial a student attends; the unit of occupancy.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub struct SlotPair {
    /// Recitation meeting.
    pub recitation: Slot,
    /// Tutorial meeting.
    pub tutorial: Slot,
}

impl SlotPair {
    /// Pair up a recitation and a tutorial.
    pub fn new(recitation: Slot, tutorial: Slot) -> Self {
        Self { recitation, tutorial }
    }

    /// The slot on `axis`.
    #[inline]
    pub fn get(&self, axis: Axis) -> &Slot {
        match axis {
            Axis::Recitation => &self.recitation,
            Axis::Tutorial => &self.tutorial,
        }
    }

    /// `(recitation time, tutorial time)`, ignoring instructors.
    #[inline]
    pub fn times(&self) -> (&str, &str) {
        (&self.recitation.time, &self.tutorial.time)
    }

    /// `(recitation instructor, tutorial instructor)`, ignoring times.
    #[inline]
    pub fn instructors(&self) -> (&str, &str) {
        (&self.recitation.instructor, &self.tutorial.instructor)
    }
}

impl Display for SlotPair {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} / {}", self.recitation, self.tutorial)
    }
}
