//! Win32 implementations of the platform collaborators.

pub mod capture;
pub mod input;
pub mod process;
pub mod window;

pub use capture::GdiScreenGrabber;
pub use input::SendInputSynthesizer;
pub use process::Win32GameHost;
