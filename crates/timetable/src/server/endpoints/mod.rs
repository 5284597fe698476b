pub mod catalog;
pub mod halls;
pub mod selection;
pub mod status;
pub mod students;
