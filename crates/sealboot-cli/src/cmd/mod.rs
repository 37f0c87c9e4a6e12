pub(crate) mod delete;
pub(crate) mod reconstruct;
pub(crate) mod stub;
pub(crate) mod write;
