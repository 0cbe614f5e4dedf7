//! Anti-detection page preparation
//!
//! Applies the emulation overrides and the startup script that make a
//! freshly created page read as a normal interactive browser: consistent
//! user agent and platform, plausible language list, perturbed canvas
//! read-back, relaxed permission probes, and a `window.chrome` feature
//! object. Also plants consent cookies and blocks static resources the
//! result pages do not need.

use anyhow::{Context, Result};
use chromiumoxide::Page;
use chromiumoxide::cdp::browser_protocol::emulation::{
    MediaFeature, SetDeviceMetricsOverrideParams, SetEmulatedMediaParams, SetLocaleOverrideParams,
    SetTimezoneOverrideParams, SetTouchEmulationEnabledParams,
};
use chromiumoxide::cdp::browser_protocol::fetch::{
    AuthChallengeResponse, AuthChallengeResponseResponse, ContinueRequestParams,
    ContinueWithAuthParams, EnableParams as FetchEnableParams, EventAuthRequired,
    EventRequestPaused, RequestPattern, RequestStage,
};
use chromiumoxide::cdp::browser_protocol::network::{
    CookieParam, EnableParams as NetworkEnableParams, SetBlockedUrLsParams, SetCookiesParams,
    SetUserAgentOverrideParams,
};
use chromiumoxide::cdp::browser_protocol::page::AddScriptToEvaluateOnNewDocumentParams;
use futures_util::StreamExt;
use std::time::{SystemTime, UNIX_EPOCH};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use super::fingerprint::Fingerprint;
use super::proxy::ProxyRecord;

/// Static resource patterns blocked on search pages
///
/// Result extraction only needs the DOM; images, fonts and stylesheets
/// just slow the page down.
const BLOCKED_RESOURCE_PATTERNS: &[&str] = &[
    "*.png", "*.jpg", "*.jpeg", "*.gif", "*.svg", "*.webp", "*.css", "*.woff", "*.woff2",
    "*.ttf", "*.otf",
];

/// Startup script masking automation signals
///
/// `__LANGUAGES__` is substituted with a JSON array consistent with the
/// context locale before injection. The canvas noise keeps read-back
/// pixels within +/-1 of their true value so rendering stays visually
/// identical while the fingerprint hash changes per context.
const STEALTH_SCRIPT: &str = r#"
(() => {
    Object.defineProperty(navigator, 'webdriver', { get: () => false });
    Object.defineProperty(navigator, 'languages', { get: () => __LANGUAGES__ });

    const originalGetImageData = CanvasRenderingContext2D.prototype.getImageData;
    CanvasRenderingContext2D.prototype.getImageData = function(x, y, width, height) {
        const imageData = originalGetImageData.call(this, x, y, width, height);
        const pixels = imageData.data;
        for (let i = 0; i < pixels.length; i += 4) {
            pixels[i] = pixels[i] + Math.floor(Math.random() * 3) - 1;
            pixels[i+1] = pixels[i+1] + Math.floor(Math.random() * 3) - 1;
            pixels[i+2] = pixels[i+2] + Math.floor(Math.random() * 3) - 1;
        }
        return imageData;
    };

    const originalPermissions = navigator.permissions;
    navigator.permissions.query = async (param) => {
        if (param.name === 'notifications' || param.name === 'clipboard-read' || param.name === 'clipboard-write') {
            return { state: "prompt", onchange: null };
        }
        return originalPermissions.query(param);
    };

    window.chrome = { runtime: {} };
    window.navigator.chrome = { runtime: {} };
})();
"#;

/// Build the startup script for a context locale
fn stealth_script(locale: &str) -> String {
    let primary = locale.split('-').next().unwrap_or(locale).to_string();
    let mut languages = vec![locale.to_string(), primary];
    for fallback in ["en-US", "en"] {
        if !languages.iter().any(|l| l == fallback) {
            languages.push(fallback.to_string());
        }
    }
    let json = serde_json::to_string(&languages).unwrap_or_else(|_| "[]".to_string());
    STEALTH_SCRIPT.replace("__LANGUAGES__", &json)
}

/// Prepare a freshly created page before its first navigation
///
/// Applies overrides in this order: network domain (needed for cookies,
/// blocking, and response events), user agent, device metrics and touch,
/// locale and timezone, emulated color scheme, then the startup script.
/// Consent cookies and resource blocking are best-effort.
pub async fn prepare_page(
    page: &Page,
    fingerprint: &Fingerprint,
    locale: &str,
    timezone: &str,
    stealth: bool,
) -> Result<()> {
    page.execute(NetworkEnableParams::default())
        .await
        .context("Failed to enable network domain")?;

    page.execute(SetUserAgentOverrideParams {
        user_agent: fingerprint.user_agent.clone(),
        accept_language: Some(Fingerprint::accept_language(locale)),
        platform: Some(fingerprint.platform().to_string()),
        user_agent_metadata: None,
    })
    .await
    .context("Failed to override user agent")?;

    let (width, height) = fingerprint.viewport;
    page.execute(
        SetDeviceMetricsOverrideParams::builder()
            .width(i64::from(width))
            .height(i64::from(height))
            .device_scale_factor(fingerprint.device_scale_factor)
            .mobile(false)
            .build()
            .map_err(anyhow::Error::msg)?,
    )
    .await
    .context("Failed to override device metrics")?;

    page.execute(SetTouchEmulationEnabledParams {
        enabled: fingerprint.has_touch,
        max_touch_points: None,
    })
    .await
    .context("Failed to set touch emulation")?;

    page.execute(SetLocaleOverrideParams {
        locale: Some(locale.to_string()),
    })
    .await
    .context("Failed to override locale")?;

    page.execute(SetTimezoneOverrideParams {
        timezone_id: timezone.to_string(),
    })
    .await
    .context("Failed to override timezone")?;

    page.execute(SetEmulatedMediaParams {
        media: None,
        features: Some(vec![MediaFeature {
            name: "prefers-color-scheme".to_string(),
            value: fingerprint.color_scheme.as_media_value().to_string(),
        }]),
    })
    .await
    .context("Failed to emulate color scheme")?;

    if stealth {
        page.execute(AddScriptToEvaluateOnNewDocumentParams {
            source: stealth_script(locale),
            include_command_line_api: None,
            world_name: None,
            run_immediately: None,
        })
        .await
        .context("Failed to inject stealth script")?;
    }

    if let Err(e) = plant_consent_cookies(page).await {
        warn!("Failed to plant consent cookies: {e}");
    }
    if let Err(e) = block_static_resources(page).await {
        warn!("Failed to block static resources: {e}");
    }

    debug!("Page prepared (stealth: {stealth})");
    Ok(())
}

/// Plant cookies of a user that has already cleared the consent screen
///
/// Without these the first navigation lands on the consent interstitial
/// instead of the result page.
async fn plant_consent_cookies(page: &Page) -> Result<()> {
    let epoch_secs = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
        .saturating_sub(100_000);

    let consent = CookieParam::builder()
        .name("CONSENT")
        .value(format!("YES+cb.{epoch_secs}"))
        .domain(".google.com")
        .path("/")
        .build()
        .map_err(anyhow::Error::msg)?;
    let nid = CookieParam::builder()
        .name("NID")
        .value("511=abcdefghijklmnopqrstuvwxyz")
        .domain(".google.com")
        .path("/")
        .build()
        .map_err(anyhow::Error::msg)?;

    page.execute(SetCookiesParams {
        cookies: vec![consent, nid],
    })
    .await
    .context("Failed to set cookies")?;
    Ok(())
}

/// Block static resources the extraction never looks at
async fn block_static_resources(page: &Page) -> Result<()> {
    page.execute(SetBlockedUrLsParams {
        urls: BLOCKED_RESOURCE_PATTERNS
            .iter()
            .map(|p| (*p).to_string())
            .collect(),
    })
    .await
    .context("Failed to set blocked URLs")?;
    Ok(())
}

/// Answer proxy authentication challenges for a page
///
/// Chrome takes the proxy server on context creation but has no channel
/// for credentials, so requests are intercepted via the fetch domain and
/// every auth challenge is answered with the proxy record's credentials.
/// The returned task runs until the page closes and must be aborted when
/// the owning context is disposed.
pub async fn spawn_proxy_auth_responder(
    page: &Page,
    proxy: &ProxyRecord,
) -> Result<JoinHandle<()>> {
    page.execute(FetchEnableParams {
        patterns: Some(vec![RequestPattern {
            url_pattern: Some("*".to_string()),
            resource_type: None,
            request_stage: Some(RequestStage::Request),
        }]),
        handle_auth_requests: Some(true),
    })
    .await
    .context("Failed to enable fetch interception")?;

    let mut paused = page
        .event_listener::<EventRequestPaused>()
        .await
        .context("Failed to listen for paused requests")?;
    let mut auth_required = page
        .event_listener::<EventAuthRequired>()
        .await
        .context("Failed to listen for auth challenges")?;

    let username = proxy.username.clone().unwrap_or_default();
    let password = proxy.password.clone().unwrap_or_default();
    let page = page.clone();

    Ok(tokio::task::spawn(async move {
        loop {
            tokio::select! {
                Some(event) = paused.next() => {
                    let resume = ContinueRequestParams {
                        request_id: event.request_id.clone(),
                        url: None,
                        method: None,
                        post_data: None,
                        headers: None,
                        intercept_response: None,
                    };
                    if page.execute(resume).await.is_err() {
                        break;
                    }
                }
                Some(event) = auth_required.next() => {
                    debug!("Answering proxy auth challenge");
                    let answer = ContinueWithAuthParams {
                        request_id: event.request_id.clone(),
                        auth_challenge_response: AuthChallengeResponse {
                            response: AuthChallengeResponseResponse::ProvideCredentials,
                            username: Some(username.clone()),
                            password: Some(password.clone()),
                        },
                    };
                    if page.execute(answer).await.is_err() {
                        break;
                    }
                }
                else => break,
            }
        }
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stealth_script_embeds_locale_languages() {
        let script = stealth_script("it-IT");
        assert!(script.contains(r#"["it-IT","it","en-US","en"]"#));
        assert!(!script.contains("__LANGUAGES__"));
    }

    #[test]
    fn test_stealth_script_deduplicates_english() {
        let script = stealth_script("en-US");
        assert!(script.contains(r#"["en-US","en"]"#));
    }
}
