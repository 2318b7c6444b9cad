// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Inspect data models stored in HDF5 files.

use std::path::PathBuf;

use clap::{AppSettings, Parser};
use log::{debug, info};

use sdp_datamodels::{import_any_from_hdf5, setup_logging, SdpError};

#[derive(Parser)]
#[clap(name = "datamodels", version, about)]
#[clap(global_setting(AppSettings::ArgRequiredElseHelp))]
#[clap(global_setting(AppSettings::DeriveDisplayOrder))]
#[clap(global_setting(AppSettings::DisableHelpSubcommand))]
#[clap(global_setting(AppSettings::InferSubcommands))]
#[clap(global_setting(AppSettings::PropagateVersion))]
enum Args {
    /// Print a one-line description of each data model in an HDF5 file.
    Summary {
        /// The HDF5 file to read.
        #[clap(name = "FILE", parse(from_os_str))]
        file: PathBuf,

        /// The verbosity of the program. Increase by specifying multiple times
        /// (e.g. -vv).
        #[clap(short, long, parse(from_occurrences))]
        verbosity: u8,
    },

    /// Print quality statistics of each data model in an HDF5 file.
    Assess {
        /// The HDF5 file to read.
        #[clap(name = "FILE", parse(from_os_str))]
        file: PathBuf,

        /// Free-form text recorded with each assessment.
        #[clap(short, long)]
        context: Option<String>,

        /// Print the assessments as json.
        #[clap(long)]
        json: bool,

        /// The verbosity of the program. Increase by specifying multiple times
        /// (e.g. -vv).
        #[clap(short, long, parse(from_occurrences))]
        verbosity: u8,
    },
}

fn main() {
    // We don't return Result from main because it prints the debug
    // representation of the error.
    if let Err(e) = try_main() {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

fn try_main() -> Result<(), SdpError> {
    let args = Args::parse();

    let verbosity = match &args {
        Args::Summary { verbosity, .. } => *verbosity,
        Args::Assess { verbosity, .. } => *verbosity,
    };
    setup_logging(verbosity).expect("Failed to initialise logging.");
    debug!(
        "datamodels {} {}",
        match args {
            Args::Summary { .. } => "summary",
            Args::Assess { .. } => "assess",
        },
        env!("CARGO_PKG_VERSION")
    );

    match args {
        Args::Summary { file, .. } => {
            let models = import_any_from_hdf5(&file)?;
            info!("{}: {} data model(s)", file.display(), models.len());
            for (i, model) in models.iter().enumerate() {
                println!("{i}: {model}");
            }
        }

        Args::Assess {
            file,
            context,
            json,
            ..
        } => {
            let models = import_any_from_hdf5(&file)?;
            let assessments = models
                .iter()
                .map(|m| m.assess(context.as_deref()))
                .collect::<Vec<_>>();
            if json {
                println!("{}", serde_json::to_string_pretty(&assessments)?);
            } else {
                for (model, qa) in models.iter().zip(assessments) {
                    println!("{}: {qa}", model.data_model());
                }
            }
        }
    }

    Ok(())
}
