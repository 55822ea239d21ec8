//! Configuration for seqdraw
//!
//! User preferences persisted between runs. The only interpreted option is
//! the theme; the store keeps whatever else it finds.

pub mod preferences;

pub use preferences::{
    PREFERENCES_ENV, Preferences, PreferencesError, PreferencesStore, ThemePreference,
};
