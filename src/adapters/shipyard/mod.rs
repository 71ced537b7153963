mod client;

pub use client::{RegisterError, RegistrationRequest, ShipyardClient};

#[cfg(test)]
pub(crate) use client::tests::spawn_silent_remote;
