pub mod endpoint;
pub mod error;
pub mod json;

pub mod elastic {
    pub mod client;
    pub mod requests;
    pub mod response;
}

pub mod file {
    pub mod error;
    pub mod sink;
}
