pub mod memory;
pub mod posting;
pub mod store;
