//! Unified error type.

use std::fmt;

/// The error type threaded through the middleware chain.
///
/// Application-level outcomes (404, 302, 422, etc.) are expressed as
/// [`Response`](crate::Response) values, not as `Error`s. An `Error` is what a
/// middleware returns when it cannot produce a response at all. The chain never
/// converts one into a response by itself: it travels back through every
/// awaited [`Next::run`](crate::Next::run) until some middleware catches it, or
/// it reaches the caller of [`Road::request`](crate::Road::request).
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The request body claimed to be JSON and was not. The message is the
    /// parser's own.
    #[error(transparent)]
    Json(#[from] serde_json::Error),

    /// The request body claimed to be form-urlencoded and was not.
    #[error("invalid form body: {0}")]
    Form(#[from] serde_urlencoded::de::Error),

    /// A capability accessor was called on a [`Context`](crate::Context) whose
    /// chain never installed the middleware providing it.
    #[error("`{0}` is not available: its middleware is not installed on this road")]
    MissingCapability(&'static str),

    /// A cookie name that is not an RFC 6265 token.
    #[error("invalid cookie name `{name}`")]
    InvalidCookie { name: String },

    /// Anything raised by user code.
    #[error("{0}")]
    Handler(Box<dyn std::error::Error + Send + Sync + 'static>),
}

impl Error {
    /// Wraps any error raised by a handler.
    pub fn other<E>(err: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Handler(Box::new(err))
    }

    /// An ad-hoc error carrying only a message.
    pub fn msg(message: impl fmt::Display) -> Self {
        Self::Handler(Box::new(Message(message.to_string())))
    }

    /// Returns the wrapped handler error if it is an `E`.
    ///
    /// Lets the caller of [`Road::request`](crate::Road::request) recover the
    /// exact value a middleware failed with.
    pub fn downcast_ref<E>(&self) -> Option<&E>
    where
        E: std::error::Error + 'static,
    {
        match self {
            Self::Handler(inner) => inner.downcast_ref::<E>(),
            _ => None,
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Self::other(e)
    }
}

#[derive(Debug)]
struct Message(String);

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::error::Error for Message {}

/// Result alias used by every handler in the chain.
pub type Result<T, E = Error> = std::result::Result<T, E>;
