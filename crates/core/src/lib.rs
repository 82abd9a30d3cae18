pub mod audio;
pub mod pipeline;
pub mod rendering;
pub mod shared;
