//! Per-call options and the overlay the client always enforces.
//!
//! Options are merged in one direction only: the caller's [`CallOptions`]
//! form the base layer and [`CriticalOptions`] are laid over them. Whatever
//! a caller passes for TLS verification, proxying, the outbound interface or
//! the `Cookie` header is replaced by the client's own settings.

use std::time::Duration;

use crate::config::{ClientConfig, OutputInterface, ProxyUrl, TlsVerification};

/// Options a caller may pass for a single call.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CallOptions {
    /// Extra headers, applied over the request's own headers.
    pub headers: Vec<(String, String)>,
    /// Overrides the total request timeout for this call.
    pub timeout: Option<Duration>,
    /// Requested TLS mode. Always replaced by the critical overlay.
    pub tls: Option<TlsVerification>,
    /// Requested proxy. Always replaced by the critical overlay.
    pub proxy: Option<ProxyUrl>,
    /// Requested outbound interface. Always replaced by the critical overlay.
    pub output_interface: Option<OutputInterface>,
}

impl CallOptions {
    /// Adds an extra header.
    #[must_use]
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Sets the timeout for this call.
    #[must_use]
    pub const fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

/// Settings the client enforces on every call.
///
/// The cookie store is also critical: the `Cookie` header always comes from
/// it, never from the caller.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CriticalOptions {
    /// TLS verification mode.
    pub tls: TlsVerification,
    /// Proxy for every request.
    pub proxy: Option<ProxyUrl>,
    /// Local address outbound connections bind to.
    pub output_interface: Option<OutputInterface>,
}

impl CriticalOptions {
    /// Extracts the critical settings from `config`.
    #[must_use]
    pub fn from_config(config: &ClientConfig) -> Self {
        Self {
            tls: config.tls().clone(),
            proxy: config.proxy().cloned(),
            output_interface: config.output_interface(),
        }
    }
}

/// The result of laying [`CriticalOptions`] over [`CallOptions`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EffectiveOptions {
    /// Caller headers with any `Cookie` header removed.
    pub headers: Vec<(String, String)>,
    /// The caller's timeout override, if any.
    pub timeout: Option<Duration>,
    /// TLS mode from the overlay.
    pub tls: TlsVerification,
    /// Proxy from the overlay.
    pub proxy: Option<ProxyUrl>,
    /// Outbound interface from the overlay.
    pub output_interface: Option<OutputInterface>,
}

impl EffectiveOptions {
    /// Lays `critical` over `call`.
    #[must_use]
    pub fn layer(call: CallOptions, critical: &CriticalOptions) -> Self {
        let headers = call
            .headers
            .into_iter()
            .filter(|(name, _)| !name.eq_ignore_ascii_case("cookie"))
            .collect();

        Self {
            headers,
            timeout: call.timeout,
            tls: critical.tls.clone(),
            proxy: critical.proxy.clone(),
            output_interface: critical.output_interface,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_critical_overlay_wins() {
        let call = CallOptions {
            tls: Some(TlsVerification::Disabled),
            proxy: Some(ProxyUrl::new("http://evil:1").unwrap()),
            output_interface: Some(OutputInterface::new("10.0.0.9").unwrap()),
            ..CallOptions::default()
        };
        let critical = CriticalOptions {
            tls: TlsVerification::Enabled,
            proxy: None,
            output_interface: None,
        };

        let effective = EffectiveOptions::layer(call, &critical);
        assert_eq!(effective.tls, TlsVerification::Enabled);
        assert!(effective.proxy.is_none());
        assert!(effective.output_interface.is_none());
    }

    #[test]
    fn test_caller_cookie_header_is_dropped() {
        let call = CallOptions::default()
            .header("Cookie", "sessionid=forged")
            .header("X-Extra", "1");

        let effective = EffectiveOptions::layer(call, &CriticalOptions::default());
        assert_eq!(effective.headers, vec![("X-Extra".to_string(), "1".to_string())]);
    }

    #[test]
    fn test_non_critical_timeout_passes_through() {
        let call = CallOptions::default().timeout(Duration::from_secs(5));
        let effective = EffectiveOptions::layer(call, &CriticalOptions::default());
        assert_eq!(effective.timeout, Some(Duration::from_secs(5)));
    }
}
