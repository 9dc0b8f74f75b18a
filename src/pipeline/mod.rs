pub mod chunk;
pub mod collect;
pub mod pairs;
pub mod predict;
pub mod sample;
pub mod score;
