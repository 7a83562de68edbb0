//! Per-sender conversation state

/// Step of the scripted dialogue a sender is currently in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Phase {
    #[default]
    Menu,
    SelectingPackage,
    SelectingTime,
    SearchResults,
}

/// Conversation state for one sender.
///
/// Created on first message and retained for the process lifetime.
#[derive(Debug, Clone, Default)]
pub struct ConversationState {
    pub phase: Phase,
    pub selected_package: Option<String>,
    /// Every (user text, bot text) exchange, oldest first
    pub history: Vec<(String, String)>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_state() {
        let state = ConversationState::default();
        assert_eq!(state.phase, Phase::Menu);
        assert!(state.selected_package.is_none());
        assert!(state.history.is_empty());
    }
}
