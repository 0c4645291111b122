pub mod analyse;
pub mod regions;
pub mod tasks;
