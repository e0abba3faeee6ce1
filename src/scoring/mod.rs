pub mod model;
pub mod scorer;
pub mod stats;
