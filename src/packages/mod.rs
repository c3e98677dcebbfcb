//! Packages: name resolution, installed-module probing and pip.

pub mod aliases;
pub mod pip;
pub mod probe;

pub use aliases::{resolve, PackageAliases};
pub use pip::{OutdatedPackage, Pip, UpgradeReport};
pub use probe::{InterpreterProbe, ModuleProbe, ProbeMode, ProbeOutcome};
