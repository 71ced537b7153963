pub mod docker;
pub mod procfs;
pub mod runtime;
pub mod shipyard;

pub use docker::DockerApi;
pub use procfs::{ProcfsConfig, ProcfsProcessSource};
pub use runtime::RuntimeClient;
pub use shipyard::{RegisterError, RegistrationRequest, ShipyardClient};
