pub mod command;
pub mod config;
pub mod form;
pub mod generate;
pub mod git;
pub mod hosting;
pub mod params;
pub mod publish;
pub mod repository;
pub mod schedule;
pub mod writer;

use chrono::Local;
use std::path::{Path, PathBuf};

use crate::params::RunParameters;
use crate::repository::REPOSITORY_PREFIX;

pub struct ContribGen {
    pub base_dir: PathBuf,
    pub params: RunParameters,
    directory: String,
}

impl ContribGen {
    pub fn new<P: AsRef<Path>>(base_dir: P, params: RunParameters) -> Self {
        let directory = match params.repository() {
            Some(target) => target.directory_name(),
            None => format!(
                "{}{}",
                REPOSITORY_PREFIX,
                Local::now().format("%Y-%m-%d-%H-%M-%S")
            ),
        };

        Self {
            base_dir: base_dir.as_ref().to_path_buf(),
            params,
            directory,
        }
    }

    /// Working repository the run writes into.
    pub fn target_dir(&self) -> PathBuf {
        self.base_dir.join(&self.directory)
    }
}
