pub mod config;
pub mod countries;
pub mod metrics;
pub mod pipeline;
pub mod request;
pub mod runner;
pub mod testing;
pub mod topology;
pub mod workspace;

pub use config::{
    load_config, load_config_from_str, validate_config, Config, ConfigError, DatasetConfig,
    HillshadeMode, PathsConfig, PipelineConfig, RenderConfig, ServerConfig, ToolsConfig,
};
pub use countries::{CatalogError, Country, CountryCatalog};
pub use pipeline::{
    MapArtifacts, MapPipeline, PipelineError, PipelineStatus, PublishedArtifacts, StageId,
    StageReport,
};
pub use request::{BoundingWindow, ContinentSelection, CountrySelection, MapRequest, RequestError};
pub use runner::{ProcessRunner, RunnerError, Tool, ToolInvocation, ToolOutput, ToolRunner};
pub use topology::{rewrite_topology_file, TopologyError};
pub use workspace::{WorkspaceError, WorkspaceManager};
