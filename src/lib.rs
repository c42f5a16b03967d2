//! DALN client — onboarding engine for a data-sharing cooperative.

pub mod api;
pub mod chain;
pub mod config;
pub mod error;
pub mod membership;
pub mod onboarding;
pub mod storage;
pub mod util;
