//! Outbound checkout link.
//!
//! Opening the link is fire-and-forget. A failed launch is logged and
//! otherwise ignored; nothing downstream depends on it.

use url::Url;

use crate::error::ValidationError;

/// Something that can hand a URL to the outside world.
pub trait Launcher: Send + Sync {
    fn launch(&self, url: &Url) -> Result<(), Box<dyn std::error::Error + Send + Sync>>;
}

/// Opens the URL with the platform's default handler.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemLauncher;

impl Launcher for SystemLauncher {
    fn launch(&self, url: &Url) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        open::that(url.as_str())?;
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct CheckoutLink {
    url: Url,
}

impl CheckoutLink {
    pub fn parse(raw: &str) -> Result<Self, ValidationError> {
        let url = Url::parse(raw).map_err(|e| ValidationError::InvalidValue {
            field: "checkout.url".into(),
            message: e.to_string(),
        })?;
        match url.scheme() {
            "http" | "https" => Ok(Self { url }),
            other => Err(ValidationError::InvalidValue {
                field: "checkout.url".into(),
                message: format!("unsupported scheme '{other}'"),
            }),
        }
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Hand the URL to `launcher`. Returns whether the launch succeeded.
    pub fn open(&self, launcher: &dyn Launcher) -> bool {
        match launcher.launch(&self.url) {
            Ok(()) => {
                tracing::info!(url = %self.url, "checkout link opened");
                true
            }
            Err(e) => {
                tracing::warn!(url = %self.url, error = %e, "failed to open checkout link");
                false
            }
        }
    }
}
