mod buffer;
mod image;
mod labels;
mod mask;
mod prompt;

pub use buffer::SageBuffer;
pub use image::SageImage;

pub use mask::BinaryMask;
pub use mask::ScoreMask;
pub use mask::ToBinary;
pub use mask::open_mask;
pub use mask::save_mask;

pub use prompt::Prompt;
pub use prompt::Shape;
pub use prompt::ShapeKind;
pub use prompt::shapes_to_box;
pub use prompt::shapes_to_points;

pub use labels::AcceptedMask;
pub use labels::LabelMap;
pub use labels::label_color;
