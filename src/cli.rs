use crate::{
    integrate, opts,
    util::cli::{self, Exec, GlobalFlags, TextWrapper},
};
use std::path::PathBuf;
use structopt::StructOpt;

#[derive(Debug, StructOpt)]
#[structopt(
    bin_name = crate::NAME,
    about = "Wires the SmiSdk React Native plugin into a project's Android app",
    global_settings = cli::GLOBAL_SETTINGS,
)]
pub struct Input {
    #[structopt(flatten)]
    flags: GlobalFlags,
    #[structopt(
        long = "dry-run",
        help = "Report what would change without writing anything",
        parse(from_flag = opts::WriteMode::from_flag),
    )]
    write_mode: opts::WriteMode,
    #[structopt(
        long = "network-config",
        help = "Also permit clear-text traffic to the trusted domain",
        parse(from_flag = opts::NetworkConfig::from_flag),
    )]
    network_config: opts::NetworkConfig,
    #[structopt(
        long = "config",
        help = "Settings file to use instead of `smisdk.toml` in the project root",
        parse(from_os_str)
    )]
    config: Option<PathBuf>,
    #[structopt(
        name = "project-root",
        help = "Root of the React Native project",
        default_value = "../..",
        parse(from_os_str)
    )]
    root: PathBuf,
}

impl Exec for Input {
    type Report = integrate::Error;

    fn global_flags(&self) -> GlobalFlags {
        self.flags
    }

    fn exec(self, wrapper: &TextWrapper) -> Result<(), Self::Report> {
        let Self {
            flags: _,
            write_mode,
            network_config,
            config,
            root,
        } = self;
        integrate::exec(
            wrapper,
            &root,
            config.as_deref(),
            write_mode,
            network_config,
        )
        .map(|_| ())
    }
}
