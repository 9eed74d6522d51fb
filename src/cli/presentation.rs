//! CLI presentation: tables, structured dumps, and pull progress.

mod dump;
mod pull;
mod table;

pub use dump::{render_dump, to_json_pretty, DumpFormat};
pub use pull::PullRenderer;
pub use table::{
    format_container_table, format_image_table, format_port, human_size, relative_time,
};
