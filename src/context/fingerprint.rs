//! Randomized browser fingerprint parameters
//!
//! Each browsing context draws a fresh fingerprint so consecutive
//! searches do not present identical viewport/user-agent/media
//! combinations to the target site.

use rand::Rng;
use rand::seq::IndexedRandom;

use crate::utils::constants::{USER_AGENTS, VIEWPORTS};

/// Emulated `prefers-color-scheme` value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorScheme {
    Light,
    Dark,
    NoPreference,
}

impl ColorScheme {
    /// CSS media feature value for emulation
    #[must_use]
    pub fn as_media_value(&self) -> &'static str {
        match self {
            Self::Light => "light",
            Self::Dark => "dark",
            Self::NoPreference => "no-preference",
        }
    }
}

/// Fingerprint parameters applied to one browsing context
#[derive(Debug, Clone)]
pub struct Fingerprint {
    pub viewport: (u32, u32),
    pub user_agent: String,
    pub color_scheme: ColorScheme,
    pub device_scale_factor: f64,
    pub has_touch: bool,
}

impl Fingerprint {
    /// Draw a randomized fingerprint
    ///
    /// Viewports and user agents come from small curated tables of
    /// common real-world values; exotic combinations are themselves a
    /// fingerprinting signal. Touch capability is rare on desktop
    /// (~20%), as is a high-DPI scale factor (~30%).
    #[must_use]
    pub fn randomize() -> Self {
        let mut rng = rand::rng();

        let viewport = *VIEWPORTS
            .choose(&mut rng)
            .expect("BUG: viewport table is empty");
        let user_agent = USER_AGENTS
            .choose(&mut rng)
            .expect("BUG: user agent table is empty")
            .to_string();
        let color_scheme = match rng.random_range(0..3) {
            0 => ColorScheme::Light,
            1 => ColorScheme::Dark,
            _ => ColorScheme::NoPreference,
        };
        let device_scale_factor = if rng.random::<f64>() > 0.7 { 2.0 } else { 1.0 };
        let has_touch = rng.random_bool(0.2);

        Self {
            viewport,
            user_agent,
            color_scheme,
            device_scale_factor,
            has_touch,
        }
    }

    /// Platform string consistent with the drawn user agent
    ///
    /// An `X11` user agent reporting `Win32` via CDP is an easy
    /// inconsistency for detectors to spot.
    #[must_use]
    pub fn platform(&self) -> &'static str {
        if self.user_agent.contains("Macintosh") {
            "MacIntel"
        } else if self.user_agent.contains("X11") || self.user_agent.contains("Linux") {
            "Linux x86_64"
        } else {
            "Win32"
        }
    }

    /// Accept-Language header value for the given locale
    #[must_use]
    pub fn accept_language(locale: &str) -> String {
        let primary = locale.split('-').next().unwrap_or(locale);
        if primary.eq_ignore_ascii_case("en") {
            "en-US,en;q=0.9".to_string()
        } else {
            format!("{locale},{primary};q=0.9,en-US;q=0.8,en;q=0.7")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_randomize_draws_from_tables() {
        for _ in 0..50 {
            let fp = Fingerprint::randomize();
            assert!(VIEWPORTS.contains(&fp.viewport));
            assert!(USER_AGENTS.contains(&fp.user_agent.as_str()));
            assert!(fp.device_scale_factor == 1.0 || fp.device_scale_factor == 2.0);
        }
    }

    #[test]
    fn test_platform_matches_user_agent() {
        let mut fp = Fingerprint::randomize();
        fp.user_agent = "Mozilla/5.0 (X11; Linux x86_64) ...".to_string();
        assert_eq!(fp.platform(), "Linux x86_64");
        fp.user_agent = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) ...".to_string();
        assert_eq!(fp.platform(), "MacIntel");
        fp.user_agent = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) ...".to_string();
        assert_eq!(fp.platform(), "Win32");
    }

    #[test]
    fn test_accept_language_shape() {
        assert_eq!(
            Fingerprint::accept_language("it-IT"),
            "it-IT,it;q=0.9,en-US;q=0.8,en;q=0.7"
        );
        assert_eq!(Fingerprint::accept_language("en-US"), "en-US,en;q=0.9");
    }
}
