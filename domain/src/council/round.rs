//! Council rounds

use serde::{Deserialize, Serialize};

/// Round of a council run. Rounds run strictly in sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Round {
    /// Round 1 - every reviewer answers the query
    Responses,
    /// Round 2 - every answering reviewer ranks the others, anonymized
    Review,
    /// Round 3 - the synthesizer writes the final answer
    Synthesis,
}

impl Round {
    pub fn as_str(&self) -> &'static str {
        match self {
            Round::Responses => "round1",
            Round::Review => "round2",
            Round::Synthesis => "round3",
        }
    }

    pub fn number(&self) -> u8 {
        match self {
            Round::Responses => 1,
            Round::Review => 2,
            Round::Synthesis => 3,
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Round::Responses => "Round 1: Responses",
            Round::Review => "Round 2: Peer Review",
            Round::Synthesis => "Round 3: Synthesis",
        }
    }
}

impl std::fmt::Display for Round {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_names() {
        assert_eq!(Round::Responses.as_str(), "round1");
        assert_eq!(Round::Review.number(), 2);
        assert_eq!(Round::Synthesis.to_string(), "Round 3: Synthesis");
    }
}
