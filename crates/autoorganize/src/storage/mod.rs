pub mod filesystem;

pub use filesystem::{
    copy_file, delete_file, ensure_directory, file_size, file_stem, move_file, rename_extras,
};
