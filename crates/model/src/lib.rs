pub mod pagination {
    pub mod cursor;
    pub mod page;
}

pub mod records {
    pub mod batch;
    pub mod document;
}
