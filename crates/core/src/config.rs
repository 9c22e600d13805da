//! Process-wide configuration surface (`spec.md` §6).

/// Recognized configuration options, constructed once per [`crate::App`].
#[derive(Debug, Clone)]
pub struct Config {
    /// Throttles animation-driven re-renders.
    pub fps_cap: Option<u32>,
    /// Rejects oversize event batches with a protocol error.
    pub max_event_bytes: usize,
    /// Rejects oversize drawlists before submission.
    pub max_drawlist_bytes: usize,
    /// 1-4; an interactive burst temporarily adds +1.
    pub max_frames_in_flight: u8,
    /// Enables native cursor emit for focused inputs.
    pub use_v2_cursor: bool,
    /// Validate drawlist opcode parameters before handing them to the backend.
    pub drawlist_validate_params: bool,
    /// Reuse the drawlist output buffer across frames instead of allocating.
    pub reuse_output_buffer: bool,
    /// Capacity of the encoded-string cache used by the drawlist builder.
    pub encoded_string_cache_cap: usize,
    /// Uniform root padding in cells.
    pub root_padding: u16,
    /// Responsive breakpoint thresholds consumed by composites via `use_viewport`.
    pub breakpoints: Breakpoints,
    /// Inspector hook: called after every render.
    pub internal_on_render: Option<fn()>,
    /// Inspector hook: called after every layout pass.
    pub internal_on_layout: Option<fn()>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Breakpoints {
    pub sm_max: u16,
    pub md_max: u16,
    pub lg_max: u16,
}

impl Default for Breakpoints {
    fn default() -> Self {
        Self {
            sm_max: 80,
            md_max: 120,
            lg_max: 160,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            fps_cap: Some(60),
            max_event_bytes: 1 << 20,
            max_drawlist_bytes: 8 << 20,
            max_frames_in_flight: 1,
            use_v2_cursor: true,
            drawlist_validate_params: cfg!(debug_assertions),
            reuse_output_buffer: true,
            encoded_string_cache_cap: 512,
            root_padding: 0,
            breakpoints: Breakpoints::default(),
            internal_on_render: None,
            internal_on_layout: None,
        }
    }
}

impl Config {
    /// Interactive input events temporarily raise the in-flight frame cap by
    /// one so input latency survives transport jitter (`spec.md` §4.7).
    pub fn interactive_budget(&self) -> u8 {
        1
    }

    pub fn max_frames_with_interactive_budget(&self) -> u8 {
        self.max_frames_in_flight + self.interactive_budget()
    }

    /// Validates the configuration against a backend's reported capability
    /// markers; disagreement is a configuration error (`spec.md` §6).
    pub fn validate_against(&self, caps: &crate::backend::BackendCapabilities) -> crate::Result<()> {
        if self.max_frames_in_flight < 1 || self.max_frames_in_flight > 4 {
            return Err(crate::CoreError::InvalidProps(format!(
                "max_frames_in_flight must be in 1..=4, got {}",
                self.max_frames_in_flight
            )));
        }
        if let Some(backend_cap) = caps.max_event_bytes {
            if self.max_event_bytes > backend_cap {
                return Err(crate::CoreError::InvalidProps(format!(
                    "max_event_bytes {} exceeds backend capability {}",
                    self.max_event_bytes, backend_cap
                )));
            }
        }
        if let Some(fps_cap) = caps.fps_cap {
            if let Some(configured) = self.fps_cap {
                if configured > fps_cap {
                    return Err(crate::CoreError::InvalidProps(format!(
                        "fps_cap {} exceeds backend capability {}",
                        configured, fps_cap
                    )));
                }
            }
        }
        Ok(())
    }
}
