pub(crate) mod channels;
pub(crate) mod image;
pub(crate) mod layer;
pub(crate) mod metadata;
pub(crate) mod role;
pub(crate) mod samples;
pub(crate) mod select;
