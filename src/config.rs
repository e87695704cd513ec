//! Environment configuration for streaming sessions.

use std::env;
use std::time::Duration;

pub const DEFAULT_HELD_OUT_LINES: usize = 4;
pub const DEFAULT_RENDER_TIMEOUT_SEC: u64 = 30;
pub const DEFAULT_WIDTH_PADDING: usize = 2;

pub const HELD_OUT_LINES_ENV: &str = "ASC_HELD_OUT_LINES";
pub const RENDERER_ENV: &str = "ASC_RENDERER";
pub const RENDER_TIMEOUT_ENV: &str = "ASC_RENDER_TIMEOUT_SEC";
pub const WIDTH_PADDING_ENV: &str = "ASC_WIDTH_PADDING";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RendererKind {
    /// External `glow` process per render.
    Glow,
    /// In-process markdown renderer.
    Builtin,
}

impl RendererKind {
    fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "glow" => Some(Self::Glow),
            "builtin" | "internal" => Some(Self::Builtin),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamConfig {
    /// Trailing rendered lines withheld until the stream ends.
    pub held_out_lines: usize,
    pub renderer: RendererKind,
    pub render_timeout: Duration,
    /// Columns subtracted from the terminal width before rendering.
    pub width_padding: usize,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            held_out_lines: DEFAULT_HELD_OUT_LINES,
            renderer: RendererKind::Glow,
            render_timeout: Duration::from_secs(DEFAULT_RENDER_TIMEOUT_SEC),
            width_padding: DEFAULT_WIDTH_PADDING,
        }
    }
}

impl StreamConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            held_out_lines: env_positive(HELD_OUT_LINES_ENV).unwrap_or(defaults.held_out_lines),
            renderer: env_string_opt(RENDERER_ENV)
                .and_then(|value| RendererKind::parse(&value))
                .unwrap_or(defaults.renderer),
            render_timeout: env_positive(RENDER_TIMEOUT_ENV)
                .map(|secs| Duration::from_secs(secs as u64))
                .unwrap_or(defaults.render_timeout),
            width_padding: env_string_opt(WIDTH_PADDING_ENV)
                .and_then(|value| value.trim().parse().ok())
                .unwrap_or(defaults.width_padding),
        }
    }
}

fn env_positive(key: &str) -> Option<usize> {
    env_string_opt(key)
        .and_then(|value| value.trim().parse::<usize>().ok())
        .filter(|value| *value > 0)
}

fn env_string_opt(key: &str) -> Option<String> {
    env::var(key).ok().and_then(|value| {
        if value.trim().is_empty() {
            None
        } else {
            Some(value)
        }
    })
}

#[cfg(test)]
mod tests {
    use super::{
        RendererKind, StreamConfig, HELD_OUT_LINES_ENV, RENDERER_ENV, RENDER_TIMEOUT_ENV,
        WIDTH_PADDING_ENV,
    };
    use std::env;
    use std::sync::{Mutex, OnceLock};
    use std::time::Duration;

    struct EnvGuard {
        key: &'static str,
        previous: Option<String>,
    }

    impl Drop for EnvGuard {
        fn drop(&mut self) {
            if let Some(value) = &self.previous {
                env::set_var(self.key, value);
            } else {
                env::remove_var(self.key);
            }
        }
    }

    fn env_lock() -> std::sync::MutexGuard<'static, ()> {
        static LOCK: OnceLock<Mutex<()>> = OnceLock::new();
        LOCK.get_or_init(|| Mutex::new(()))
            .lock()
            .expect("env lock poisoned")
    }

    fn set_env_guard(key: &'static str, value: Option<&str>) -> EnvGuard {
        let previous = env::var(key).ok();
        if let Some(value) = value {
            env::set_var(key, value);
        } else {
            env::remove_var(key);
        }
        EnvGuard { key, previous }
    }

    #[test]
    fn defaults_apply_without_env() {
        let _lock = env_lock();
        let _g1 = set_env_guard(HELD_OUT_LINES_ENV, None);
        let _g2 = set_env_guard(RENDERER_ENV, None);
        let _g3 = set_env_guard(RENDER_TIMEOUT_ENV, None);
        let _g4 = set_env_guard(WIDTH_PADDING_ENV, None);

        assert_eq!(StreamConfig::from_env(), StreamConfig::default());
        assert_eq!(StreamConfig::default().held_out_lines, 4);
    }

    #[test]
    fn env_values_override_defaults() {
        let _lock = env_lock();
        let _g1 = set_env_guard(HELD_OUT_LINES_ENV, Some("3"));
        let _g2 = set_env_guard(RENDERER_ENV, Some("Builtin"));
        let _g3 = set_env_guard(RENDER_TIMEOUT_ENV, Some("5"));
        let _g4 = set_env_guard(WIDTH_PADDING_ENV, Some("0"));

        let config = StreamConfig::from_env();
        assert_eq!(config.held_out_lines, 3);
        assert_eq!(config.renderer, RendererKind::Builtin);
        assert_eq!(config.render_timeout, Duration::from_secs(5));
        assert_eq!(config.width_padding, 0);
    }

    #[test]
    fn invalid_values_fall_back() {
        let _lock = env_lock();
        let _g1 = set_env_guard(HELD_OUT_LINES_ENV, Some("0"));
        let _g2 = set_env_guard(RENDERER_ENV, Some("lynx"));
        let _g3 = set_env_guard(RENDER_TIMEOUT_ENV, Some("soon"));
        let _g4 = set_env_guard(WIDTH_PADDING_ENV, Some(" "));

        assert_eq!(StreamConfig::from_env(), StreamConfig::default());
    }
}
