//! Runner module for the external geospatial tools.
//!
//! Every pipeline stage except publication is a single invocation of an
//! external binary. The `ToolRunner` trait is the seam between the pipeline
//! driver and the operating system, so the driver can be exercised against
//! a mock without GDAL, ImageMagick or topojson installed.
//!
//! # Example
//!
//! ```ignore
//! use reliefmap_core::runner::{OutputSink, ProcessRunner, Tool, ToolInvocation, ToolRunner};
//!
//! let runner = ProcessRunner::new(ToolsConfig::default(), None);
//! runner.validate().await?;
//!
//! let invocation = ToolInvocation::new(Tool::Geo2topo, vec!["countries.geo.json".into()])
//!     .with_sink(OutputSink::File(PathBuf::from("countries.topo.json")));
//! let output = runner.run(&invocation).await?;
//! println!("geo2topo finished in {} ms", output.duration_ms);
//! ```

mod error;
mod process;
mod traits;
mod types;

pub use error::RunnerError;
pub use process::ProcessRunner;
pub use traits::ToolRunner;
pub use types::{OutputSink, Tool, ToolInvocation, ToolOutput};
