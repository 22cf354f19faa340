//! Anonymous response labels and the label ↔ identity mapping.
//!
//! Round-1 responses are shown to reviewers as `Response A`, `Response B`, …
//! so that no reviewer knows which worker wrote what. The mapping is built
//! once per query and never changes afterwards; it drives both round-2 prompt
//! construction and client-facing de-anonymization.

use crate::core::error::DomainError;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::HashSet;

const LABEL_PREFIX: &str = "Response ";

/// Anonymous label for one round-1 response (Value Object)
///
/// Labels are spreadsheet-style letters: `A`..`Z`, then `AA`, `AB`, …
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Label(usize);

impl Label {
    /// Label for the response at `index` (0-based) in labelling order.
    pub fn from_index(index: usize) -> Self {
        Self(index)
    }

    pub fn index(&self) -> usize {
        self.0
    }

    /// Just the letters, e.g. `"B"` or `"AA"`.
    pub fn letters(&self) -> String {
        let mut n = self.0 + 1;
        let mut letters = Vec::new();
        while n > 0 {
            let rem = (n - 1) % 26;
            letters.push((b'A' + rem as u8) as char);
            n = (n - 1) / 26;
        }
        letters.iter().rev().collect()
    }

    /// Parse the letter part (`"C"`, `"AB"`).
    pub fn from_letters(letters: &str) -> Option<Self> {
        if letters.is_empty() || !letters.bytes().all(|b| b.is_ascii_uppercase()) {
            return None;
        }
        let mut n: usize = 0;
        for b in letters.bytes() {
            n = n.checked_mul(26)?.checked_add((b - b'A' + 1) as usize)?;
        }
        Some(Self(n - 1))
    }
}

impl std::fmt::Display for Label {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}{}", LABEL_PREFIX, self.letters())
    }
}

impl std::str::FromStr for Label {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let letters = s.strip_prefix(LABEL_PREFIX).unwrap_or(s).trim();
        Label::from_letters(letters).ok_or_else(|| DomainError::InvalidLabel(s.to_string()))
    }
}

impl Serialize for Label {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Label {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// What a single reviewer is shown in round 2.
///
/// `reviewed` is always every label except `excluded`, in labelling order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReviewAssignment {
    pub reviewer: String,
    pub excluded: Label,
    pub reviewed: Vec<Label>,
}

/// Ordered bijection between labels and worker identities.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct LabelMapping {
    identities: Vec<String>,
}

impl LabelMapping {
    /// Assign labels in input order: the first identity gets `Response A`.
    ///
    /// Fails if an identity appears twice, since the mapping must stay a
    /// bijection.
    pub fn assign<I, S>(identities: I) -> Result<Self, DomainError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let identities: Vec<String> = identities.into_iter().map(Into::into).collect();
        let mut seen = HashSet::new();
        for identity in &identities {
            if !seen.insert(identity.as_str()) {
                return Err(DomainError::InvalidLabel(format!(
                    "identity '{}' would receive two labels",
                    identity
                )));
            }
        }
        Ok(Self { identities })
    }

    pub fn len(&self) -> usize {
        self.identities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.identities.is_empty()
    }

    /// All labels in order
    pub fn labels(&self) -> Vec<Label> {
        (0..self.identities.len()).map(Label::from_index).collect()
    }

    /// `(label, identity)` pairs in order
    pub fn iter(&self) -> impl Iterator<Item = (Label, &str)> {
        self.identities
            .iter()
            .enumerate()
            .map(|(i, id)| (Label::from_index(i), id.as_str()))
    }

    pub fn identity_of(&self, label: Label) -> Option<&str> {
        self.identities.get(label.index()).map(String::as_str)
    }

    pub fn label_of(&self, identity: &str) -> Option<Label> {
        self.identities
            .iter()
            .position(|id| id == identity)
            .map(Label::from_index)
    }

    pub fn contains(&self, label: Label) -> bool {
        label.index() < self.identities.len()
    }

    /// Build the round-2 assignment for `reviewer`.
    ///
    /// Self-exclusion is matched on worker identity, never on anything the
    /// reviewer wrote. Returns `None` if the reviewer has no label (it did
    /// not answer round 1).
    pub fn assignment_for(&self, reviewer: &str) -> Option<ReviewAssignment> {
        let excluded = self.label_of(reviewer)?;
        let reviewed = self.labels().into_iter().filter(|l| *l != excluded).collect();
        Some(ReviewAssignment {
            reviewer: reviewer.to_string(),
            excluded,
            reviewed,
        })
    }
}

impl Serialize for LabelMapping {
    /// Serialized as an ordered object: `{"Response A": "alpha", ...}`.
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_map(self.iter().map(|(label, id)| (label, id)))
    }
}
