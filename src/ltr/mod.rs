pub mod extractor;
pub mod features;
pub mod pipeline;
pub mod trainer;
pub mod vector;
