//! Splits raw model output into the user-facing message and the trailing
//! bullet list of candidate insights.

use serde::Serialize;

/// Literal marker the model places before its insight list.
pub const INSIGHTS_MARKER: &str = "###INSIGHTS###";

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ParsedResponse {
    pub message: String,
    pub candidate_insights: Vec<String>,
}

/// Never fails: a missing marker means the whole response is the message.
pub fn parse_insights(raw_response: &str) -> ParsedResponse {
    let Some((message, tail)) = raw_response.split_once(INSIGHTS_MARKER) else {
        return ParsedResponse {
            message: raw_response.trim().to_string(),
            candidate_insights: vec![],
        };
    };

    let candidate_insights = tail
        .lines()
        .map(str::trim)
        .filter_map(|line| line.strip_prefix('-'))
        .map(|rest| rest.trim().to_string())
        .filter(|rest| !rest.is_empty())
        .collect();

    ParsedResponse {
        message: message.trim().to_string(),
        candidate_insights,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_splits_message_and_bullets() {
        let raw = "Tack! Hur stort är teamet idag?\n\n###INSIGHTS###\n- Företag: 25 personer B2B SaaS\n- Roll: Senior Backend Developer\n";
        let parsed = parse_insights(raw);
        assert_eq!(parsed.message, "Tack! Hur stort är teamet idag?");
        assert_eq!(
            parsed.candidate_insights,
            vec![
                "Företag: 25 personer B2B SaaS".to_string(),
                "Roll: Senior Backend Developer".to_string(),
            ]
        );
    }

    #[test]
    fn test_missing_marker_returns_whole_message() {
        let parsed = parse_insights("  Berätta mer om rollen.  ");
        assert_eq!(parsed.message, "Berätta mer om rollen.");
        assert!(parsed.candidate_insights.is_empty());
    }

    #[test]
    fn test_ignores_non_bullet_lines_after_marker() {
        let raw = "Hej\n###INSIGHTS###\nHär är insikterna:\n- Team: 5 utvecklare\n* Budget: fel markör\n";
        let parsed = parse_insights(raw);
        assert_eq!(parsed.candidate_insights, vec!["Team: 5 utvecklare"]);
    }

    #[test]
    fn test_empty_bullets_are_dropped() {
        let parsed = parse_insights("Hej\n###INSIGHTS###\n-\n-   \n");
        assert!(parsed.candidate_insights.is_empty());
    }

    #[test]
    fn test_empty_input() {
        assert_eq!(parse_insights(""), ParsedResponse::default());
    }
}
