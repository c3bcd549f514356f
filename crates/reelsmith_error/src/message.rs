//! Errors that carry only a message.
//!
//! These cover failures whose detail comes from a foreign library
//! (`serde_json`, `config`, `reqwest`) and has no structure worth keeping.

macro_rules! message_error {
    ($(#[$meta:meta])* $name:ident, $label:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
        #[display("{}: {} at line {} in {}", $label, message, line, file)]
        pub struct $name {
            /// What went wrong
            pub message: String,
            /// Line number where the error was created
            pub line: u32,
            /// File where the error was created
            pub file: &'static str,
        }

        impl $name {
            /// Creates the error at the caller's location.
            #[track_caller]
            pub fn new(message: impl Into<String>) -> Self {
                let location = std::panic::Location::caller();
                Self {
                    message: message.into(),
                    line: location.line(),
                    file: location.file(),
                }
            }
        }
    };
}

message_error!(
    /// A run, beat list, or timing file that is not the expected JSON.
    ///
    /// ```
    /// use reelsmith_error::JsonError;
    ///
    /// let err = JsonError::new("beats.json: expected an array");
    /// assert!(err.to_string().starts_with("JSON Error: beats.json"));
    /// ```
    JsonError,
    "JSON Error"
);

message_error!(
    /// Unusable configuration: unknown provider, unset key variable, bad
    /// override, or an unreadable TOML source.
    ConfigError,
    "Configuration Error"
);

message_error!(
    /// The HTTP client could not be set up.
    HttpError,
    "HTTP Error"
);
