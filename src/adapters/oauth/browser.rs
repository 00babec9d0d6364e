//! Implements AuthWindowPort by handing the authorization URL to the user's
//! default browser.

use crate::domain::DomainError;
use crate::ports::AuthWindowPort;
use tracing::debug;

pub struct SystemBrowser;

impl AuthWindowPort for SystemBrowser {
    fn open(&self, url: &str) -> Result<(), DomainError> {
        debug!(%url, "opening authorization URL in the system browser");
        open::that(url).map_err(|e| {
            DomainError::PopupBlocked(format!(
                "no browser could be launched ({}); open this URL yourself: {}",
                e, url
            ))
        })
    }

    fn close(&self) {
        // A CLI cannot force-close a tab in the user's browser; the landing
        // page already tells them the window can be closed.
        debug!("authorization flow finished; the browser tab can be closed");
    }
}
