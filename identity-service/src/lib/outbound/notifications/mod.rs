pub mod companion;

pub use companion::HttpCompanionNotifier;
