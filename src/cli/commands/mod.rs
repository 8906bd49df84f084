mod generate;
mod list;

pub use generate::cmd_generate;
pub use list::{cmd_list_comics, cmd_locations, cmd_purge};
