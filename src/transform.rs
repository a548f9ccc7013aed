pub(crate) mod affine;
pub(crate) mod composite;
pub(crate) mod resample;
