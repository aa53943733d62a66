pub mod bucket;
pub mod queue;
pub mod seed;
pub mod titrator;
