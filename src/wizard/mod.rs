//! Guided SSH onboarding: identity info, key generation, provider
//! instructions, then SSH config and a connection test.

pub mod controller;
pub mod machine;
pub mod prompt;
pub mod protocol;
pub mod stdio;

pub use controller::WizardController;
pub use machine::{IdentityInfo, WizardMachine, WizardSession, WizardSnapshot, WizardStep};
pub use protocol::{WizardCommand, WizardResponse};
