//! Command line interface.
//!
//! `futon-proxy [OPTIONS] [FUTON_DIRECTORY]`. Flags override values read
//! from `--config`; anything left unset keeps its default.

use std::path::PathBuf;

use clap::{error::ErrorKind, CommandFactory, Parser};

use crate::config::{read_config, ConfigError, ProxyConfig};

#[derive(Debug, Parser)]
#[command(name = "futon-proxy", version)]
#[command(about = "Serve a local copy of the CouchDB admin interface and proxy everything else", long_about = None)]
pub struct Cli {
    /// IP to use for client connections [default: 127.0.0.1]
    #[arg(short, long)]
    pub address: Option<String>,

    /// Port to use for client connections [default: 8080]
    #[arg(short, long)]
    pub port: Option<u16>,

    /// The base URL of a running CouchDB node [default: 127.0.0.1:5984]
    #[arg(short, long)]
    pub couch: Option<String>,

    /// TOML configuration file
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Log level when RUST_LOG is unset [default: debug]
    #[arg(long)]
    pub log_level: Option<String>,

    /// Serve files that resolve outside the document root
    #[arg(long)]
    pub allow_outside_root: bool,

    /// Directory holding the admin interface [default: .]
    pub futon_directory: Option<PathBuf>,
}

impl Cli {
    /// Usage error when the positional directory does not exist.
    pub fn check_directory(&self) -> Result<(), clap::Error> {
        match &self.futon_directory {
            Some(dir) if !dir.is_dir() => Err(Self::command().error(
                ErrorKind::ValueValidation,
                format!("{:?} does not exist.", dir.display().to_string()),
            )),
            _ => Ok(()),
        }
    }

    /// Merge the optional config file with command line overrides.
    ///
    /// The result is not validated yet.
    pub fn into_config(self) -> Result<ProxyConfig, ConfigError> {
        let mut config = match &self.config {
            Some(path) => read_config(path)?,
            None => ProxyConfig::default(),
        };

        if let Some(address) = self.address {
            config.listener.address = address;
        }
        if let Some(port) = self.port {
            config.listener.port = port;
        }
        if let Some(couch) = self.couch {
            config.backend = couch;
        }
        if let Some(level) = self.log_level {
            config.log_level = level;
        }
        if self.allow_outside_root {
            config.assets.confine_to_root = false;
        }
        if let Some(dir) = self.futon_directory {
            config.document_root = dir;
        }
        Ok(config)
    }
}
