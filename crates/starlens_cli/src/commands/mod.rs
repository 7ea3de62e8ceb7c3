pub(crate) mod analyze;
pub(crate) mod collect;
pub(crate) mod meta;
