pub mod loader;
pub mod schema;
pub mod snapshot;

pub use loader::{
    database_path, default_database_path, load_config, load_config_from_str, validate_config,
};
pub use schema::{
    AutoOrganizeConfig, EpisodeOrganizeOptions, MovieOrganizeOptions, OrganizeOptionsCommon,
};
pub use snapshot::SharedConfig;
