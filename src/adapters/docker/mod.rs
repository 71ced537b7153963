mod client;

pub use client::DockerApi;
