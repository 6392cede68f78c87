#![cfg(feature = "cli")]
#![forbid(unsafe_code)]

use smisdk_android::{cli::Input, util::cli::exec, NAME};

fn main() {
    exec::<Input>(NAME)
}
