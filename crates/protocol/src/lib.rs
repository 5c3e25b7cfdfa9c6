pub mod config;
pub mod shared_str;
pub mod types;

pub use config::Config;
pub use shared_str::SharedStr;
pub use types::{Color, HexColorError, Point, Rect};
