//! Configuration for the usergate gateway and backend.

use ::std::{fs::File, io::BufReader, path::Path};

use ::clap::Parser;
use ::serde::de::DeserializeOwned;
use ::serde_json::from_reader;

use crate::error::{Result, UsergateError};

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
/// Command line arguments for the gateway and the backend.
pub struct Args {
    /// path to the config file, built-in defaults are used when it is missing
    #[arg(long)]
    pub config_path: Option<String>,
}

impl Args {
    /// helper function for exporting the `clap::Parser::parse` function
    pub fn parse_args() -> Self {
        Args::parse()
    }

    /// Load the config from `config_path`, or fall back to `C::default()`.
    pub fn load_config_or_default<C>(&self) -> Result<C>
    where
        C: DeserializeOwned + Default,
    {
        self.config_path
            .as_deref()
            .map_or_else(|| Ok(C::default()), |path| load_config(path))
    }
}

/// Read a JSON config file into `C`.
pub fn load_config<C, P>(path: P) -> Result<C>
where
    C: DeserializeOwned,
    P: AsRef<Path>,
{
    let file = File::open(path).map_err(UsergateError::fail_to_load_config)?;
    let reader = BufReader::new(file);
    from_reader(reader).map_err(UsergateError::fail_to_load_config)
}
