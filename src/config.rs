use anyhow::Result;
use clap::Parser;
use serde::Deserialize;
use std::env;
use std::fs;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "marginalia")]
#[command(about = "HTTP annotation sync for a tree of PDF documents", long_about = None)]
pub struct Cli {
    #[arg(short = 'c', long = "config")]
    pub config_path: Option<String>,

    /// Listen address, overrides the config file.
    #[arg(short = 'a', long = "addr")]
    pub addr: Option<String>,

    /// Document tree root, overrides the config file.
    #[arg(short = 'r', long = "root")]
    pub root: Option<String>,
}

pub fn default_config_path() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".marginalia")
        .join("config.yaml")
}

fn default_addr() -> String {
    "0.0.0.0:6969".to_string()
}

fn default_root() -> String {
    ".".to_string()
}

#[derive(Debug, Deserialize)]
pub struct App {
    #[serde(default = "default_addr")]
    addr: String,
    #[serde(default = "default_root")]
    root: String,
}

impl Default for App {
    fn default() -> Self {
        App {
            addr: default_addr(),
            root: default_root(),
        }
    }
}

impl App {
    pub fn get_addr(&self) -> &str {
        &self.addr
    }

    pub fn get_root(&self) -> &str {
        &self.root
    }
}

#[derive(Debug, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub app: App,
}

impl Config {
    pub fn new(path: &str) -> Result<Self> {
        let cfg = Config::load_config(path)?;
        Ok(cfg)
    }

    /// CLI flags win over the config file.
    pub fn apply_cli(&mut self, cli: &Cli) {
        if let Some(addr) = &cli.addr {
            self.app.addr = addr.clone();
        }
        if let Some(root) = &cli.root {
            self.app.root = root.clone();
        }
    }

    fn load_config(path: &str) -> Result<Config> {
        let yaml_str = fs::read_to_string(path)?;
        let yaml_with_env = Config::substitute_env_vars(&yaml_str);
        let config: Config = serde_yaml::from_str(&yaml_with_env)?;
        Ok(config)
    }

    /// Expand `${VAR}` and `${VAR:-default}` references against the process
    /// environment.
    fn substitute_env_vars(yaml_str: &str) -> String {
        let mut result = yaml_str.to_string();
        let mut offset = 0;

        while let Some(start) = result[offset..].find("${") {
            let actual_start = offset + start;
            let Some(end) = result[actual_start..].find('}') else {
                break;
            };
            let var_name = &result[actual_start + 2..actual_start + end];

            let env_value = if let Some(default_start) = var_name.find(":-") {
                let actual_var = &var_name[..default_start];
                let default_val = &var_name[default_start + 2..];
                env::var(actual_var).unwrap_or_else(|_| default_val.to_string())
            } else {
                env::var(var_name).unwrap_or_else(|_| {
                    tracing::warn!("environment variable '{}' not found", var_name);
                    String::new()
                })
            };

            result.replace_range(actual_start..actual_start + end + 1, &env_value);
            offset = actual_start + env_value.len();
        }

        result
    }
}
