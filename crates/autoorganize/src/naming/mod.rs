pub mod matcher;
pub mod parser;
pub mod pattern;

pub use matcher::{best_match, is_name_match, match_score, normalize, unique_best_match};
pub use parser::{is_video_extension, is_video_path, RegexNameParser, VIDEO_EXTENSIONS};
pub use pattern::{expand, sanitize_segment, TokenValues};
