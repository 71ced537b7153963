pub mod container;
pub mod image;
pub mod metrics;
pub mod process;
pub mod work;

pub use container::{ContainerId, ContainerSnapshot};
pub use image::Image;
pub use metrics::ContainerMetric;
pub use process::ProcessSample;
pub use work::{Destination, WorkUnit};
