///
/// CachePolicy
///

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum CachePolicy {
    /// One instance per `(entity, primary key)` for the session's lifetime.
    #[default]
    Identity,
    /// Every load materializes a fresh instance.
    None,
}

///
/// SessionConfig
/// Plain settings a session is built with.
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct SessionConfig {
    pub cache: CachePolicy,
    /// Fetch-size hint applied when a query carries none.
    pub fetch_size: Option<u32>,
    /// Emit a `debug` event for every statement issued.
    pub log_statements: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            cache: CachePolicy::Identity,
            fetch_size: None,
            log_statements: true,
        }
    }
}
