use colored::Colorize as _;
use std::fmt::{Debug, Display};

pub type TextWrapper = textwrap::Wrapper<'static, textwrap::NoHyphenation>;

pub fn text_wrapper() -> TextWrapper {
    TextWrapper::with_splitter(textwrap::termwidth(), textwrap::NoHyphenation)
}

pub mod colors {
    use colored::Color;

    pub const ERROR: Color = Color::BrightRed;
    pub const WARNING: Color = Color::BrightYellow;
    pub const ACTION_REQUEST: Color = Color::BrightMagenta;
    pub const VICTORY: Color = Color::BrightGreen;
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Label {
    Error,
    ActionRequest,
    Victory,
}

impl Label {
    pub fn color(self) -> colored::Color {
        match self {
            Self::Error => colors::ERROR,
            Self::ActionRequest => colors::ACTION_REQUEST,
            Self::Victory => colors::VICTORY,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Error => "error",
            Self::ActionRequest => "action request",
            Self::Victory => "victory",
        }
    }

    pub fn exit_code(self) -> i8 {
        match self {
            Self::Victory => 0,
            _ => 1,
        }
    }
}

#[derive(Clone, Debug)]
pub struct Report {
    pub label: Label,
    msg: String,
    details: String,
}

impl Report {
    pub fn new(label: Label, msg: impl Display, details: impl Display) -> Self {
        Self {
            label,
            msg: format!("{}", msg),
            details: format!("{}", details),
        }
    }

    pub fn error(msg: impl Display, details: impl Display) -> Self {
        Self::new(Label::Error, msg, details)
    }

    pub fn action_request(msg: impl Display, details: impl Display) -> Self {
        Self::new(Label::ActionRequest, msg, details)
    }

    fn format(&self, wrapper: &TextWrapper) -> String {
        static INDENT: &str = "    ";
        let head = wrapper.fill(&format!(
            "{} {}",
            format!("{}:", self.label.as_str()).color(self.label.color()).bold(),
            self.msg.as_str().bold()
        ));
        let wrapper = wrapper
            .clone()
            .initial_indent(INDENT)
            .subsequent_indent(INDENT);
        format!("{}\n{}\n", head, wrapper.fill(&self.details))
    }

    pub fn print(&self, wrapper: &TextWrapper) {
        let s = self.format(wrapper);
        if matches!(self.label, Label::Error) {
            eprint!("{}", s)
        } else {
            print!("{}", s)
        }
    }
}

pub trait Reportable: Debug {
    fn report(&self) -> Report;
}

impl Reportable for Report {
    fn report(&self) -> Report {
        self.clone()
    }
}

#[cfg(feature = "cli")]
mod driver {
    use super::{Report, Reportable, TextWrapper};
    use crate::opts;
    use std::fmt::Debug;
    use structopt::{
        clap::{self, AppSettings},
        StructOpt,
    };

    pub static GLOBAL_SETTINGS: &[AppSettings] =
        &[AppSettings::ColoredHelp, AppSettings::DeriveDisplayOrder];

    #[derive(Clone, Copy, Debug, StructOpt)]
    pub struct GlobalFlags {
        #[structopt(
            short = "v",
            long = "verbose",
            help = "Vomit out extensive logging (-vv for more)",
            global = true,
            multiple = true,
            parse(from_occurrences = opts::NoiseLevel::from_occurrences),
        )]
        pub noise_level: opts::NoiseLevel,
    }

    pub trait Exec: Debug + StructOpt {
        type Report: Reportable;

        fn global_flags(&self) -> GlobalFlags;

        fn exec(self, wrapper: &TextWrapper) -> Result<(), Self::Report>;
    }

    fn init_logging(noise_level: opts::NoiseLevel) {
        use env_logger::{Builder, Env};
        let default_level = match noise_level {
            opts::NoiseLevel::Polite => "warn",
            opts::NoiseLevel::LoudAndProud => "smisdk_android=info",
            opts::NoiseLevel::FranklyQuitePedantic => "info,smisdk_android=debug",
        };
        let env = Env::default().default_filter_or(default_level);
        Builder::from_env(env).init();
    }

    #[derive(Debug)]
    enum Exit {
        Report(Report),
        Clap(clap::Error),
    }

    impl Exit {
        fn report(reportable: impl Reportable) -> Self {
            log::info!("exiting with {:#?}", reportable);
            Self::Report(reportable.report())
        }

        fn do_the_thing(self, wrapper: TextWrapper) -> ! {
            match self {
                Self::Report(report) => {
                    report.print(&wrapper);
                    std::process::exit(report.label.exit_code().into())
                }
                Self::Clap(err) => err.exit(),
            }
        }

        fn main(inner: impl FnOnce(&TextWrapper) -> Result<(), Self>) {
            let wrapper = super::text_wrapper();
            if let Err(exit) = inner(&wrapper) {
                exit.do_the_thing(wrapper)
            }
        }
    }

    pub fn exec<E: Exec>(name: &str) {
        Exit::main(|wrapper| {
            let args = std::env::args().collect::<Vec<_>>();
            let input = E::from_iter_safe(&args).map_err(Exit::Clap)?;
            init_logging(input.global_flags().noise_level);
            log::info!("{} v{}", name, env!("CARGO_PKG_VERSION"));
            log::debug!("raw args: {:#?}", args);
            input.exec(wrapper).map_err(Exit::report)
        })
    }
}

#[cfg(feature = "cli")]
pub use self::driver::*;
