use thiserror::Error;

/// Result type for renderer operations.
pub type RenderResult<T> = Result<T, RenderError>;

/// Errors surfaced by the compositor and its GPU backends.
///
/// Missing framebuffer data is deliberately absent from this list: a screen
/// without data is shown with the placeholder colour instead.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RenderError {
    /// The raw pixel format tag matches no known layout.
    #[error("unrecognized pixel format tag {0:#x}")]
    UnknownPixelFormat(u32),

    /// The pixel slice is shorter than width/height/stride require.
    #[error("framebuffer holds {actual} bytes but {width}x{height} with stride {stride} needs {required}")]
    FramebufferTooSmall {
        width: u32,
        height: u32,
        stride: u32,
        required: usize,
        actual: usize,
    },

    /// The byte size implied by width/height/stride does not fit in memory.
    #[error("framebuffer {width}x{height} is too large to address")]
    FramebufferTooLarge { width: u32, height: u32 },

    /// Width or height is zero.
    #[error("framebuffer has zero width or height")]
    EmptyFramebuffer,

    /// `init` was called before a window was supplied.
    #[error("no window set; call set_window before init")]
    NoWindow,

    /// A per-frame operation was attempted before `init` succeeded.
    #[error("renderer is not initialized")]
    NotInitialized,

    /// `init` was called on a renderer that is already running.
    #[error("renderer is already initialized")]
    AlreadyInitialized,

    /// Instance/adapter/device/surface bring-up failed.
    #[error("GPU backend initialization failed: {0}")]
    BackendInit(String),

    /// The shared screen program failed to compile or link.
    #[error("shader compilation failed: {0}")]
    ShaderCompilation(String),

    /// A texture or buffer could not be created.
    #[error("GPU resource allocation failed: {0}")]
    ResourceAllocation(String),

    /// A handle did not refer to a live resource.
    #[error("invalid resource: {0}")]
    InvalidResource(String),

    /// The presentation surface could not provide or present a frame.
    #[error("surface error: {0}")]
    Surface(String),
}
