pub mod content;
pub mod script;

pub use content::{filter_content, location_dir, safe_prompt, safe_title};
pub use script::{format_script, parse_panels, parse_summaries, split_summary};
