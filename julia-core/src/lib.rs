pub mod encode;
pub mod format;
pub mod julia;
pub mod palette;
pub mod render;
