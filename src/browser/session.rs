use crate::{browser::config::{ConnectionOptions, LaunchOptions},
            dom::DomTree,
            error::{GraderError, Result}};
use headless_chrome::{Browser, Tab};
use std::{ffi::OsStr, sync::Arc, time::Duration};

/// In-page composed-selector resolver shared by the input accessors
const RESOLVE_JS: &str = include_str!("resolve.js");

/// Browser session wrapping the Chrome/Chromium instance that has the
/// grading page open.
pub struct BrowserSession {
    /// The underlying headless_chrome Browser instance
    browser: Browser,
}

impl BrowserSession {
    /// Launch a new browser instance with the given options
    pub fn launch(options: LaunchOptions) -> Result<Self> {
        let mut launch_opts = headless_chrome::LaunchOptions::default();

        // Ignore default arguments to prevent detection by anti-bot services
        launch_opts.ignore_default_args.push(OsStr::new("--enable-automation"));
        launch_opts.args.push(OsStr::new("--disable-blink-features=AutomationControlled"));

        // A grading pass can sit idle while the operator reviews answers;
        // the default 30-second idle timeout is far too short
        launch_opts.idle_browser_timeout = Duration::from_secs(60 * 60);

        launch_opts.headless = options.headless;
        launch_opts.window_size = Some((options.window_width, options.window_height));

        if let Some(path) = options.chrome_path {
            launch_opts.path = Some(path);
        }

        if let Some(dir) = options.user_data_dir {
            launch_opts.user_data_dir = Some(dir);
        }

        launch_opts.sandbox = options.sandbox;

        let browser = Browser::new(launch_opts).map_err(|e| GraderError::LaunchFailed(e.to_string()))?;

        browser.new_tab().map_err(|e| GraderError::LaunchFailed(format!("Failed to create tab: {}", e)))?;

        Ok(Self { browser })
    }

    /// Connect to an existing browser instance via WebSocket
    pub fn connect(options: ConnectionOptions) -> Result<Self> {
        let browser = Browser::connect(options.ws_url).map_err(|e| GraderError::ConnectionFailed(e.to_string()))?;

        Ok(Self { browser })
    }

    /// Launch a browser with default options
    pub fn new() -> Result<Self> {
        Self::launch(LaunchOptions::default())
    }

    /// Get the active tab
    pub fn tab(&self) -> Result<Arc<Tab>> {
        self.get_active_tab()
    }

    /// Get all tabs
    pub fn get_tabs(&self) -> Result<Vec<Arc<Tab>>> {
        let tabs = self
            .browser
            .get_tabs()
            .lock()
            .map_err(|e| GraderError::TabOperationFailed(format!("Failed to get tabs: {}", e)))?
            .clone();

        Ok(tabs)
    }

    /// Get the currently active tab by checking the document visibility and focus state
    pub fn get_active_tab(&self) -> Result<Arc<Tab>> {
        let tabs = self.get_tabs()?;

        // First pass: check for both visibility and focus (strongest signal)
        for tab in &tabs {
            let result = tab.evaluate("document.visibilityState === 'visible' && document.hasFocus()", false);
            match result {
                Ok(remote_object) => {
                    if let Some(value) = remote_object.value {
                        if value.as_bool().unwrap_or(false) {
                            return Ok(tab.clone());
                        }
                    }
                }
                Err(e) => {
                    log::debug!("Failed to check tab status: {}", e);
                    continue;
                }
            }
        }

        // Second pass: check just for visibility (weaker signal, but better than nothing)
        for tab in &tabs {
            let result = tab.evaluate("document.visibilityState === 'visible'", false);
            match result {
                Ok(remote_object) => {
                    if let Some(value) = remote_object.value {
                        if value.as_bool().unwrap_or(false) {
                            return Ok(tab.clone());
                        }
                    }
                }
                Err(_) => continue,
            }
        }

        Err(GraderError::TabOperationFailed("No active tab found".to_string()))
    }

    /// Get the underlying Browser instance
    pub fn browser(&self) -> &Browser {
        &self.browser
    }

    /// Navigate the active tab to a URL
    pub fn navigate(&self, url: &str) -> Result<()> {
        self.tab()?
            .navigate_to(url)
            .map_err(|e| GraderError::NavigationFailed(format!("Failed to navigate to {}: {}", url, e)))?;

        Ok(())
    }

    /// Wait for navigation to complete
    pub fn wait_for_navigation(&self) -> Result<()> {
        self.tab()?
            .wait_until_navigated()
            .map_err(|e| GraderError::NavigationFailed(format!("Navigation timeout: {}", e)))?;

        Ok(())
    }

    /// Capture and index a snapshot of the active tab, shadow trees included
    pub fn extract_dom(&self) -> Result<DomTree> {
        DomTree::from_tab(&self.tab()?)
    }

    /// Read the current presentation value of the input addressed by a
    /// composed selector. `None` when the selector no longer resolves.
    pub fn read_value(&self, selector: &str) -> Result<Option<String>> {
        let selector_json = js_string(selector)?;
        let js = format!(
            r#"(function() {{
{resolve}
    const el = resolveComposed({selector});
    return el === null ? null : String(el.value);
}})()"#,
            resolve = RESOLVE_JS,
            selector = selector_json,
        );

        let result = self
            .tab()?
            .evaluate(&js, false)
            .map_err(|e| GraderError::EvaluateFailed(format!("Failed to read input value: {}", e)))?;

        match result.value {
            Some(serde_json::Value::String(s)) => Ok(Some(s)),
            Some(serde_json::Value::Null) | None => Ok(None),
            Some(other) => Ok(Some(other.to_string())),
        }
    }

    /// Write a value into the input addressed by a composed selector, the
    /// way a user-typed change looks to the page: focus, clear, set, then a
    /// bubbling `input` and `change` before blurring. Returns `false` when
    /// the selector no longer resolves.
    pub fn write_value(&self, selector: &str, value: &str) -> Result<bool> {
        let selector_json = js_string(selector)?;
        let value_json = js_string(value)?;
        let js = format!(
            r#"(function() {{
{resolve}
    const el = resolveComposed({selector});
    if (el === null) return false;
    el.focus();
    el.value = '';
    el.value = {value};
    el.dispatchEvent(new Event('input', {{ bubbles: true }}));
    el.dispatchEvent(new Event('change', {{ bubbles: true }}));
    el.blur();
    return true;
}})()"#,
            resolve = RESOLVE_JS,
            selector = selector_json,
            value = value_json,
        );

        let result = self
            .tab()?
            .evaluate(&js, false)
            .map_err(|e| GraderError::EvaluateFailed(format!("Failed to write input value: {}", e)))?;

        Ok(result.value.and_then(|v| v.as_bool()).unwrap_or(false))
    }

    /// Close the browser by closing all tabs; the process itself exits when
    /// the Browser instance is dropped
    pub fn close(&self) -> Result<()> {
        let tabs = self.get_tabs()?;
        for tab in tabs {
            let _ = tab.close(false); // Ignore errors on individual tab closes
        }
        Ok(())
    }
}

/// Encode a Rust string as a JS string literal
fn js_string(s: &str) -> Result<String> {
    serde_json::to_string(s).map_err(|e| GraderError::EvaluateFailed(format!("Failed to encode argument: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_js_string_escapes() {
        assert_eq!(js_string("plain").unwrap(), "\"plain\"");
        assert_eq!(js_string("a\"b").unwrap(), "\"a\\\"b\"");
    }

    // Integration tests (require Chrome to be installed)
    #[test]
    #[ignore] // Ignore by default, run with: cargo test -- --ignored
    fn test_launch_browser() {
        let result = BrowserSession::launch(LaunchOptions::new().headless(true));
        assert!(result.is_ok());
    }

    #[test]
    #[ignore]
    fn test_navigate() {
        let session = BrowserSession::launch(LaunchOptions::new().headless(true)).expect("Failed to launch browser");

        let result = session.navigate("about:blank");
        assert!(result.is_ok());
    }

    #[test]
    #[ignore]
    fn test_get_active_tab() {
        let session = BrowserSession::launch(LaunchOptions::new().headless(true)).expect("Failed to launch browser");

        let tab = session.get_active_tab();
        assert!(tab.is_ok());
    }

    #[test]
    #[ignore]
    fn test_read_value_on_plain_input() {
        let session = BrowserSession::launch(LaunchOptions::new().headless(true)).expect("Failed to launch browser");

        session
            .navigate("data:text/html,<html><body><input id='g' value='2.5'></body></html>")
            .expect("Failed to navigate");
        session.wait_for_navigation().expect("Navigation timeout");

        let value = session.read_value("html > body > #g").expect("read failed");
        assert_eq!(value.as_deref(), Some("2.5"));

        let missing = session.read_value("html > body > #nope").expect("read failed");
        assert!(missing.is_none());
    }
}
