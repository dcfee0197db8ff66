//! SSH key generation, connection probing and client configuration.

pub mod config;
pub mod gateway;
pub mod probe;
pub mod provider;

pub use config::{ConfigUpdate, HostEntryRequest, SshConfigSynthesizer};
pub use gateway::{KeyPair, SshGateway, SystemSshGateway};
pub use probe::{AuthSuccessMatcher, ConnectionReport, PhraseMatcher};
pub use provider::{Provider, ProviderInstructions};
