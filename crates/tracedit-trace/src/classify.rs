//! Static classification of entrypoint names.

/// Navigation-relevant class of an entrypoint.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EntrypointClass {
    /// Issues rendering work.
    Draw,
    /// Ends a frame.
    SwapBuffers,
    /// Changes the current context.
    MakeCurrent,
    Other,
}

const DRAW_CALLS: &[&str] = &[
    "glDrawArrays",
    "glDrawArraysEXT",
    "glDrawArraysIndirect",
    "glDrawArraysInstanced",
    "glDrawArraysInstancedARB",
    "glDrawArraysInstancedBaseInstance",
    "glDrawElements",
    "glDrawElementsBaseVertex",
    "glDrawElementsIndirect",
    "glDrawElementsInstanced",
    "glDrawElementsInstancedARB",
    "glDrawElementsInstancedBaseInstance",
    "glDrawElementsInstancedBaseVertex",
    "glDrawElementsInstancedBaseVertexBaseInstance",
    "glDrawRangeElements",
    "glDrawRangeElementsBaseVertex",
    "glDrawRangeElementsEXT",
    "glMultiDrawArrays",
    "glMultiDrawArraysIndirect",
    "glMultiDrawElements",
    "glMultiDrawElementsBaseVertex",
    "glMultiDrawElementsIndirect",
    "glBegin",
    "glClear",
];

const SWAP_BUFFERS: &[&str] = &[
    "glXSwapBuffers",
    "wglSwapBuffers",
    "eglSwapBuffers",
    "CGLFlushDrawable",
];

const MAKE_CURRENT: &[&str] = &[
    "glXMakeCurrent",
    "glXMakeContextCurrent",
    "wglMakeCurrent",
    "eglMakeCurrent",
    "CGLSetCurrentContext",
];

/// Classify an entrypoint by name.
pub fn classify(entrypoint: &str) -> EntrypointClass {
    if DRAW_CALLS.contains(&entrypoint) {
        EntrypointClass::Draw
    } else if SWAP_BUFFERS.contains(&entrypoint) {
        EntrypointClass::SwapBuffers
    } else if MAKE_CURRENT.contains(&entrypoint) {
        EntrypointClass::MakeCurrent
    } else {
        EntrypointClass::Other
    }
}

impl EntrypointClass {
    pub fn is_draw(self) -> bool {
        self == Self::Draw
    }

    pub fn ends_frame(self) -> bool {
        self == Self::SwapBuffers
    }
}
