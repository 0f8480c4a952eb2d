//! Human-readable texts exchanged during a session.
//!
//! Clients branch on [`crate::PromptKind`], but the draw and ace prompts keep
//! the substrings older console clients look for.

pub const DRAW_OR_STAND_MARKER: &str = "Draw a card? (yes/no):";
pub const ACE_VALUE_MARKER: &str = "Do you want it to be 1 or 11? (1/11):";

pub fn name_prompt() -> String {
    "Enter your name: ".to_string()
}

pub fn menu(player: &str) -> String {
    format!(
        "Welcome, {}! Choose an option:\n1. Play Blackjack\n2. View Rankings\n3. Exit\n> ",
        player
    )
}

pub fn invalid_option() -> String {
    "Invalid option. Please try again.".to_string()
}

pub fn farewell(player: &str) -> String {
    format!("Goodbye, {}!", player)
}

pub fn server_full() -> String {
    "Server full. Please try again later.".to_string()
}

pub fn draw_or_stand(score: u32) -> String {
    format!("Your current score: {}. {} ", score, DRAW_OR_STAND_MARKER)
}

pub fn ace_value(card: u8) -> String {
    format!("You drew a {}. {} ", card, ACE_VALUE_MARKER)
}

pub fn rankings_header() -> String {
    "Current Rankings:".to_string()
}

pub fn ranking_line(name: &str, wins: u32, draws: u32, losses: u32) -> String {
    format!("{} - W: {}, D: {}, L: {}", name, wins, draws, losses)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_draw_prompt_keeps_marker() {
        let text = draw_or_stand(14);
        assert!(text.starts_with("Your current score: 14."));
        assert!(text.contains(DRAW_OR_STAND_MARKER));
    }

    #[test]
    fn test_ace_prompt_keeps_marker() {
        let text = ace_value(11);
        assert!(text.starts_with("You drew a 11."));
        assert!(text.contains(ACE_VALUE_MARKER));
    }

    #[test]
    fn test_menu_lists_three_options() {
        let text = menu("Alice");
        assert!(text.starts_with("Welcome, Alice!"));
        assert!(text.contains("1. Play Blackjack"));
        assert!(text.contains("2. View Rankings"));
        assert!(text.contains("3. Exit"));
    }

    #[test]
    fn test_ranking_line_format() {
        assert_eq!(ranking_line("Bob", 2, 1, 0), "Bob - W: 2, D: 1, L: 0");
    }
}
