pub mod morphology;

pub use morphology::BoundaryOp;
pub use morphology::adjust_boundary;
pub use morphology::dilate;
pub use morphology::erode;
