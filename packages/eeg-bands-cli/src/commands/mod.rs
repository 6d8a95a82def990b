pub mod bands;
pub mod process;
pub mod validate;
