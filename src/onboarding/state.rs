//! Onboarding step machine — tracks which phase a member is in.

use serde::{Deserialize, Serialize};

/// The six persisted onboarding steps, ordered 1–6.
///
/// Progresses linearly: Processing → FetchingPlaid → Encryption →
/// Minting → SetAccess → MintSuccess. The persisted step for an address
/// is monotonically non-decreasing within one onboarding attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OnboardingStep {
    Processing,
    FetchingPlaid,
    Encryption,
    Minting,
    SetAccess,
    MintSuccess,
}

/// Count of members of [`OnboardingStep`].
pub const STEP_COUNT: u32 = 6;

impl OnboardingStep {
    /// 1-based position in the linear progression.
    pub fn number(&self) -> u32 {
        match self {
            Self::Processing => 1,
            Self::FetchingPlaid => 2,
            Self::Encryption => 3,
            Self::Minting => 4,
            Self::SetAccess => 5,
            Self::MintSuccess => 6,
        }
    }

    /// Display progress percentage, rounded.
    pub fn progress_percent(&self) -> u32 {
        (100.0 / STEP_COUNT as f64 * self.number() as f64).round() as u32
    }

    /// Check if a transition from `self` to `target` is valid.
    pub fn can_transition_to(&self, target: OnboardingStep) -> bool {
        use OnboardingStep::*;
        matches!(
            (self, target),
            (Processing, FetchingPlaid)
                | (FetchingPlaid, Encryption)
                | (Encryption, Minting)
                | (Minting, SetAccess)
                | (SetAccess, MintSuccess)
        )
    }

    /// Whether this step is terminal (onboarding is done).
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::MintSuccess)
    }

    /// The next step in the linear progression, if any.
    pub fn next(&self) -> Option<OnboardingStep> {
        use OnboardingStep::*;
        match self {
            Processing => Some(FetchingPlaid),
            FetchingPlaid => Some(Encryption),
            Encryption => Some(Minting),
            Minting => Some(SetAccess),
            SetAccess => Some(MintSuccess),
            MintSuccess => None,
        }
    }
}

impl std::fmt::Display for OnboardingStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Processing => "processing",
            Self::FetchingPlaid => "fetching_plaid",
            Self::Encryption => "encryption",
            Self::Minting => "minting",
            Self::SetAccess => "set_access",
            Self::MintSuccess => "mint_success",
        };
        write!(f, "{s}")
    }
}

/// The seven mutually exclusive render states: not yet started, or exactly
/// one of the six steps. No two phases render concurrently.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    NotStarted,
    Step(OnboardingStep),
}

impl Phase {
    /// Map an optional persisted step to its render state. Absence means
    /// not-started, never an error.
    pub fn from_step(step: Option<OnboardingStep>) -> Self {
        match step {
            None => Self::NotStarted,
            Some(step) => Self::Step(step),
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Step(step) if step.is_terminal())
    }

    /// Display progress percentage; 0 before the first step.
    pub fn progress_percent(&self) -> u32 {
        match self {
            Self::NotStarted => 0,
            Self::Step(step) => step.progress_percent(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL_STEPS: [OnboardingStep; 6] = [
        OnboardingStep::Processing,
        OnboardingStep::FetchingPlaid,
        OnboardingStep::Encryption,
        OnboardingStep::Minting,
        OnboardingStep::SetAccess,
        OnboardingStep::MintSuccess,
    ];

    #[test]
    fn valid_transitions() {
        use OnboardingStep::*;
        let transitions = [
            (Processing, FetchingPlaid),
            (FetchingPlaid, Encryption),
            (Encryption, Minting),
            (Minting, SetAccess),
            (SetAccess, MintSuccess),
        ];
        for (from, to) in transitions {
            assert!(from.can_transition_to(to), "{from} should transition to {to}");
        }
    }

    #[test]
    fn invalid_transitions() {
        use OnboardingStep::*;
        // Skip steps
        assert!(!Processing.can_transition_to(Encryption));
        assert!(!Encryption.can_transition_to(SetAccess));
        // Go backward
        assert!(!Minting.can_transition_to(Encryption));
        // Terminal
        assert!(!MintSuccess.can_transition_to(Processing));
        // Self-transition
        assert!(!Encryption.can_transition_to(Encryption));
    }

    #[test]
    fn next_walks_all_steps() {
        let mut current = OnboardingStep::Processing;
        for expected in &ALL_STEPS[1..] {
            let next = current.next().unwrap();
            assert_eq!(next, *expected);
            current = next;
        }
        assert!(current.next().is_none());
    }

    #[test]
    fn is_terminal() {
        assert!(OnboardingStep::MintSuccess.is_terminal());
        for step in &ALL_STEPS[..5] {
            assert!(!step.is_terminal());
        }
    }

    #[test]
    fn progress_percent_rounds() {
        assert_eq!(OnboardingStep::Processing.progress_percent(), 17);
        assert_eq!(OnboardingStep::FetchingPlaid.progress_percent(), 33);
        assert_eq!(OnboardingStep::Encryption.progress_percent(), 50);
        assert_eq!(OnboardingStep::Minting.progress_percent(), 67);
        assert_eq!(OnboardingStep::SetAccess.progress_percent(), 83);
        assert_eq!(OnboardingStep::MintSuccess.progress_percent(), 100);
    }

    #[test]
    fn absent_step_renders_not_started() {
        assert_eq!(Phase::from_step(None), Phase::NotStarted);
        assert_eq!(Phase::from_step(None).progress_percent(), 0);
    }

    #[test]
    fn display_matches_serde() {
        for step in ALL_STEPS {
            let display = format!("{step}");
            let json = serde_json::to_string(&step).unwrap();
            assert_eq!(format!("\"{display}\""), json);
        }
    }
}
