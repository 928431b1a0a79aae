pub(crate) mod rotor;
pub(crate) mod schedule;
