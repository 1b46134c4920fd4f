pub mod algorithms;
pub mod color;
pub mod frame;
pub mod sample_filter;
pub mod sampler;
pub mod stabilizer;
