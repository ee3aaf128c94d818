//! HTTP request representation.

/// HTTP request methods.
///
/// The server serves static files and only supports GET; every other method
/// token is rejected by the parser as a bad request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Method {
    /// GET - Retrieve a resource
    #[default]
    Get,
}

impl Method {
    /// Parses a method token, case-insensitively.
    ///
    /// # Example
    ///
    /// ```
    /// # use citadel::http::request::Method;
    /// assert_eq!(Method::from_token(b"GET"), Some(Method::Get));
    /// assert_eq!(Method::from_token(b"get"), Some(Method::Get));
    /// assert_eq!(Method::from_token(b"POST"), None);
    /// ```
    pub fn from_token(token: &[u8]) -> Option<Self> {
        if token.eq_ignore_ascii_case(b"GET") {
            Some(Method::Get)
        } else {
            None
        }
    }
}

/// A complete parsed HTTP request.
///
/// Produced by the parser FSM once the request line, all headers and any
/// declared body have been consumed. The path is the raw request target,
/// still percent-encoded; decoding happens during resource resolution.
#[derive(Debug, Clone)]
pub struct Request {
    /// The HTTP method (GET only)
    pub method: Method,
    /// The request path, undecoded, always starting with `/`
    pub path: String,
    /// Value of the Host header, if one was sent
    pub host: Option<String>,
    /// Declared body length; zero when no Content-Length header was sent
    pub content_length: usize,
    /// Whether the client asked for the connection to stay open
    pub keep_alive: bool,
}
