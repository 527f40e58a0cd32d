use std::collections::HashSet;

use serde::{Deserialize, Serialize};

/// Which recitation instructors may be paired with which tutorial instructors.
///
/// This is course configuration, not request data. Preference requests naming a pair not in the table are dropped.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<(String, String)>", into = "Vec<(String, String)>")]
pub struct CompatibilityTable {
    pairs: HashSet<(String, String)>,
}

impl CompatibilityTable {
    /// Table allowing exactly `pairs` of (recitation instructor, tutorial instructor).
    pub fn from_pairs<R, T>(pairs: impl IntoIterator<Item = (R, T)>) -> Self
    where
        R: Into<String>,
        T: Into<String>,
    {
        pairs.into_iter().collect()
    }

    /// Whether a recitation taught by `recitation` may go with a tutorial taught by `tutorial`.
    pub fn contains(&self, recitation: &str, tutorial: &str) -> bool {
        self.pairs.contains(&(recitation.to_owned(), tutorial.to_owned()))
    }

    /// Number of allowed pairs.
    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    /// Whether no pair is allowed.
    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }
}

impl<R: Into<String>, T: Into<String>> FromIterator<(R, T)> for CompatibilityTable {
    fn from_iter<I: IntoIterator<Item = (R, T)>>(iter: I) -> Self {
        Self {
            pairs: iter.into_iter()
                .map(|(r, t)| (r.into().trim().to_owned(), t.into().trim().to_owned()))
                .collect(),
        }
    }
}

impl From<Vec<(String, String)>> for CompatibilityTable {
    fn from(value: Vec<(String, String)>) -> Self {
        value.into_iter().collect()
    }
}

impl From<CompatibilityTable> for Vec<(String, String)> {
    fn from(value: CompatibilityTable) -> Self {
        let mut pairs = value.pairs.into_iter().collect::<Vec<_>>();
        pairs.sort();
        pairs
    }
}
