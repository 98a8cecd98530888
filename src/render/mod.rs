pub mod frame;
pub mod pipeline;
pub mod preview;
pub mod raster;
pub mod scene;
