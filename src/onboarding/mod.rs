//! Member onboarding: the step machine, the sequencer that drives it,
//! and the historical-sync poller.

pub mod poller;
pub mod sequencer;
pub mod state;

pub use poller::spawn_historical_poller;
pub use sequencer::{PollOutcome, Sequencer};
pub use state::{OnboardingStep, Phase};
