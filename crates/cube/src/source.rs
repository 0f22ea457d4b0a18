use std::future::Future;
use std::pin::Pin;

use crate::cell::Matrix;
use crate::field::CubeDescriptor;

/// Error reported by a query source when a window could not be served.
#[derive(Debug)]
pub struct SourceError {
    pub message: String,
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl std::fmt::Display for SourceError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for SourceError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source.as_ref().map(|e| e.as_ref() as _)
    }
}

impl SourceError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            source: None,
        }
    }

    pub fn with_source(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }
}

/// Rectangle of cells requested from the host.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct WindowRequest {
    pub top: usize,
    pub left: usize,
    pub width: usize,
    pub height: usize,
}

/// Type alias for a boxed future that can be sent between threads.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// The host query API a widget reads its cube from.
///
/// `fetch_window` may return fewer columns than requested; callers must not
/// assume the returned matrix has `width` columns.
pub trait QuerySource: Send + Sync {
    fn describe_cube(&self) -> CubeDescriptor;

    fn fetch_window(&self, window: WindowRequest) -> BoxFuture<'_, Result<Matrix, SourceError>>;
}
