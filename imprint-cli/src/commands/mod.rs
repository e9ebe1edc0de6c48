pub mod compare;
pub mod inject;
