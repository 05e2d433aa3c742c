pub mod bulk;
pub mod error;
pub mod metrics;
pub mod progress;

pub mod connectors {
    pub mod elastic;
    pub mod sink;
    pub mod source;
}
