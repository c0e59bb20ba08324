pub mod name;
pub mod track;

pub use name::generate_unique_name;

pub use track::progress_bar;
pub use track::progress_log;
pub use track::progress_timestamp;
