mod npy;
mod save;

pub use npy::write_numpy;

pub use save::BatchItem;
pub use save::MaskMetadata;
pub use save::batch_save_masks;
pub use save::save_masks;
