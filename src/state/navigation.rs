/// Full-page navigation, used for the hard reset on logout.
pub trait Navigator {
    fn navigate_home(&self);
}

/// For hosts without a page to reload.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopNavigator;

impl Navigator for NoopNavigator {
    fn navigate_home(&self) {
        log::debug!("[NAV] navigate_home ignored (no browser)");
    }
}

#[cfg(target_arch = "wasm32")]
#[derive(Clone, Copy, Debug, Default)]
pub struct BrowserNavigator;

#[cfg(target_arch = "wasm32")]
impl Navigator for BrowserNavigator {
    fn navigate_home(&self) {
        let Some(window) = web_sys::window() else {
            return;
        };
        if let Err(e) = window.location().set_href("/") {
            log::error!("❌ [NAV] Could not navigate home: {:?}", e);
        }
    }
}
