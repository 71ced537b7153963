pub mod collect;
pub mod queue;
pub mod registration;
pub mod scheduler;
pub mod uploader;

pub use collect::{CollectionTask, Collector};
pub use queue::work_queue;
pub use registration::register_agent;
pub use scheduler::SyncEngine;
pub use uploader::Uploader;
