//! Command line error reporting and exit codes
use std::process;

use thiserror::Error;

use spicenc::prelude::{Error, FetchError, PipelineError};

#[derive(Debug, Error)]
pub enum CliError {
    /// Invalid command line input or station registry, rejected before any request
    #[error("{0}")]
    Input(#[from] Error),
    /// HTTP client could not be set up
    #[error("failed to create HTTP client: {0}")]
    Client(#[from] FetchError),
    #[error("{0}")]
    Pipeline(#[from] PipelineError),
}

impl CliError {
    /// Non-zero status of this failure, one per error kind.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Input(e) => e.exit_code(),
            Self::Client(e) => Error::from(e.clone()).exit_code(),
            Self::Pipeline(e) => e.exit_code(),
        }
    }

    /// Reports this error on stderr and terminates the process.
    pub fn exit(&self) -> ! {
        eprintln!("Error: {}", self);

        match self {
            Self::Pipeline(PipelineError {
                error: Error::Auth(_),
                ..
            }) => {
                eprintln!();
                eprintln!("The positioning service refused the credentials.");
                eprintln!("Export a valid token with SPICENC_TOKEN=<token>");
            },
            Self::Pipeline(PipelineError {
                error: Error::NoReference(station),
                ..
            }) => {
                eprintln!();
                eprintln!("{} has no surveyed reference coordinate yet.", station);
                eprintln!("Use --mode per_run_average to derive it from the requested window");
            },
            _ => {},
        }

        process::exit(self.exit_code())
    }
}

#[cfg(test)]
mod test {
    use super::CliError;
    use spicenc::prelude::{Error, FetchError};

    #[test]
    fn exit_codes() {
        assert_eq!(
            CliError::from(Error::UnknownStation("SPICE99".to_string())).exit_code(),
            3
        );
        assert_eq!(
            CliError::from(Error::TimestampFormat("yesterday".to_string())).exit_code(),
            4
        );
        assert_eq!(
            CliError::from(FetchError::Network("tls".to_string())).exit_code(),
            5
        );
    }
}
