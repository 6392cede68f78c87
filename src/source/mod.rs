//! Finding and patching the React Native application class.

pub mod balance;
pub mod detect;
pub mod edit;
pub mod layout;
pub mod patch;
pub mod templates;

pub use self::{
    detect::{ApplicationClass, Language},
    layout::Layout,
    patch::{Lifecycle, Outcome, Patched},
    templates::Templates,
};
