//! Checkout lifecycle states

use std::fmt;

use serde::Serialize;

/// Lifecycle state of an open checkout
///
/// ```text
/// Form ──▶ Loading ──▶ Pix ──▶ Success
///  ▲          │
///  └─ Error ◀─┘
/// ```
///
/// Closing resets every state to `Form`; that path bypasses the table.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FlowState {
    #[default]
    Form,
    Loading,
    Pix,
    Success,
    Error,
}

impl FlowState {
    /// Allowed forward transitions
    pub const fn can_transition_to(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Form, Self::Loading)
                | (Self::Loading, Self::Pix | Self::Error)
                | (Self::Pix, Self::Success)
                | (Self::Error, Self::Form)
        )
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Form => "form",
            Self::Loading => "loading",
            Self::Pix => "pix",
            Self::Success => "success",
            Self::Error => "error",
        }
    }
}

impl fmt::Display for FlowState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL: [FlowState; 5] = [
        FlowState::Form,
        FlowState::Loading,
        FlowState::Pix,
        FlowState::Success,
        FlowState::Error,
    ];

    #[test]
    fn test_transition_table() {
        let allowed: Vec<_> = ALL
            .iter()
            .flat_map(|from| ALL.iter().map(move |to| (*from, *to)))
            .filter(|(from, to)| from.can_transition_to(*to))
            .collect();

        assert_eq!(
            allowed,
            vec![
                (FlowState::Form, FlowState::Loading),
                (FlowState::Loading, FlowState::Pix),
                (FlowState::Loading, FlowState::Error),
                (FlowState::Pix, FlowState::Success),
                (FlowState::Error, FlowState::Form),
            ]
        );
    }

    #[test]
    fn test_success_has_no_way_out() {
        assert!(ALL.iter().all(|s| !FlowState::Success.can_transition_to(*s)));
        assert_eq!(FlowState::default(), FlowState::Form);
    }
}
