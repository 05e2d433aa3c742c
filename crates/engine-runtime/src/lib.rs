pub mod error;
pub mod shutdown;

pub mod execution {
    pub mod coordinator;
    pub mod executor;
    pub mod factory;
    pub mod settings;
}
