pub(crate) mod fields;
pub mod text;
