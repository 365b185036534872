use serde::{Deserialize, Serialize};

/// Log section of the engine config
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
pub struct Log {
    /// Log level. One of: `debug` `info` `warning` `error` `none`.
    pub loglevel: LogLevel,
}

/// Log level understood by the engine
#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Debug,
    Info,
    #[default]
    Warning,
    Error,
    None,
}
