//! Types for the runner module.

use serde::Serialize;
use std::fmt;
use std::path::{Path, PathBuf};

use crate::config::ToolsConfig;

/// External binaries driven by the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Tool {
    Ogr2ogr,
    GdalTranslate,
    Gdalwarp,
    Gdaldem,
    Convert,
    Geo2topo,
}

impl Tool {
    pub const ALL: [Tool; 6] = [
        Tool::Ogr2ogr,
        Tool::GdalTranslate,
        Tool::Gdalwarp,
        Tool::Gdaldem,
        Tool::Convert,
        Tool::Geo2topo,
    ];

    /// Conventional binary name.
    pub fn name(&self) -> &'static str {
        match self {
            Tool::Ogr2ogr => "ogr2ogr",
            Tool::GdalTranslate => "gdal_translate",
            Tool::Gdalwarp => "gdalwarp",
            Tool::Gdaldem => "gdaldem",
            Tool::Convert => "convert",
            Tool::Geo2topo => "geo2topo",
        }
    }

    /// Configured binary path.
    pub fn binary<'a>(&self, tools: &'a ToolsConfig) -> &'a Path {
        match self {
            Tool::Ogr2ogr => &tools.ogr2ogr,
            Tool::GdalTranslate => &tools.gdal_translate,
            Tool::Gdalwarp => &tools.gdalwarp,
            Tool::Gdaldem => &tools.gdaldem,
            Tool::Convert => &tools.convert,
            Tool::Geo2topo => &tools.geo2topo,
        }
    }
}

impl fmt::Display for Tool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Where the process's standard streams go.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum OutputSink {
    /// Lines are forwarded to the tracing log.
    #[default]
    Log,
    /// stdout and stderr are both appended to this file.
    File(PathBuf),
}

/// One external process launch.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolInvocation {
    pub tool: Tool,
    pub args: Vec<String>,
    pub sink: OutputSink,
    /// Files the tool is expected to produce, for bookkeeping.
    pub outputs: Vec<PathBuf>,
}

impl ToolInvocation {
    pub fn new(tool: Tool, args: Vec<String>) -> Self {
        Self {
            tool,
            args,
            sink: OutputSink::Log,
            outputs: Vec::new(),
        }
    }

    pub fn with_sink(mut self, sink: OutputSink) -> Self {
        self.sink = sink;
        self
    }

    pub fn with_outputs(mut self, outputs: Vec<PathBuf>) -> Self {
        self.outputs = outputs;
        self
    }

    /// Shell-like rendering for logs.
    pub fn command_line(&self) -> String {
        let mut line = self.tool.name().to_string();
        for arg in &self.args {
            line.push(' ');
            if arg.is_empty() || arg.contains(char::is_whitespace) || arg.contains('\'') {
                line.push('"');
                line.push_str(arg);
                line.push('"');
            } else {
                line.push_str(arg);
            }
        }
        if let OutputSink::File(path) = &self.sink {
            line.push_str(" > ");
            line.push_str(&path.to_string_lossy());
        }
        line
    }
}

/// Outcome of a successful invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolOutput {
    pub exit_code: i32,
    pub duration_ms: u64,
    /// Number of diagnostic lines the tool wrote to stderr.
    pub stderr_lines: usize,
}
