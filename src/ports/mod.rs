pub mod container_source;
pub mod process_source;
pub mod remote_sink;

pub use container_source::{ContainerSource, RuntimeError};
pub use process_source::{ProcessError, ProcessSource};
pub use remote_sink::{RemoteSink, UploadError};
