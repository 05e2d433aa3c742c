pub mod confirmer;
pub mod error;
pub mod queue;

pub mod consumer {
    pub mod target;
    pub mod writer;
}

pub mod producer {
    pub mod reader;
}

#[cfg(test)]
pub(crate) mod testing;
