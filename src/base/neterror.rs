use std::io;
use std::sync::Arc;
use thiserror::Error;

/// Network error codes matching Chromium's `net_error_list.h`.
///
/// Only the codes the proxy resolution path can produce or forward are named;
/// anything else reported by a remote engine is carried as [`NetError::Unknown`]
/// so the original code survives the round trip.
///
/// Errors compare by their numeric code, so a contextual variant such as
/// [`NetError::NameNotResolvedFor`] equals its plain counterpart.
#[derive(Debug, Error, Clone)]
pub enum NetError {
    // Generic Errors
    #[error("Operation failed")]
    Failed,
    #[error("Operation aborted")]
    Aborted,
    #[error("Invalid argument")]
    InvalidArgument,
    #[error("Operation timed out")]
    TimedOut,
    #[error("Out of memory")]
    OutOfMemory,
    #[error("Not implemented")]
    NotImplemented,
    #[error("Access denied")]
    AccessDenied,

    // Connection Errors
    #[error("Connection closed (TCP FIN)")]
    ConnectionClosed,
    #[error("Connection reset (TCP RST)")]
    ConnectionReset,
    #[error("Connection refused")]
    ConnectionRefused,
    #[error("Connection aborted")]
    ConnectionAborted,
    #[error("Connection failed")]
    ConnectionFailed,
    #[error("Name not resolved")]
    NameNotResolved,
    #[error("Name not resolved: {domain}")]
    NameNotResolvedFor {
        domain: String,
        #[source]
        source: Arc<io::Error>,
    },
    #[error("Internet disconnected")]
    InternetDisconnected,
    #[error("Address invalid")]
    AddressInvalid,
    #[error("Address unreachable")]
    AddressUnreachable,
    #[error("Connection timed out")]
    ConnectionTimedOut,
    #[error("Host resolver queue too large")]
    HostResolverQueueTooLarge,
    #[error("Proxy connection failed")]
    ProxyConnectionFailed,
    #[error("Mandatory proxy configuration failed")]
    MandatoryProxyConfigurationFailed,
    #[error("Name resolution failed")]
    NameResolutionFailed,
    #[error("Network access denied")]
    NetworkAccessDenied,

    // URL / Proxy Errors
    #[error("Invalid URL")]
    InvalidUrl,
    #[error("Disallowed URL scheme")]
    DisallowedUrlScheme,
    #[error("Unknown URL scheme")]
    UnknownUrlScheme,
    #[error("PAC script failed")]
    PacScriptFailed,
    #[error("No supported proxies")]
    NoSupportedProxies,
    #[error("PAC not in DHCP")]
    PacNotInDhcp,
    #[error("PAC script terminated")]
    PacScriptTerminated,
    #[error("Proxy required")]
    ProxyRequired,

    #[error("Unknown error: {0}")]
    Unknown(i32),
}

impl NetError {
    pub fn as_i32(&self) -> i32 {
        match self {
            NetError::Failed => -2,
            NetError::Aborted => -3,
            NetError::InvalidArgument => -4,
            NetError::TimedOut => -7,
            NetError::OutOfMemory => -13,
            NetError::NotImplemented => -11,
            NetError::AccessDenied => -10,

            NetError::ConnectionClosed => -100,
            NetError::ConnectionReset => -101,
            NetError::ConnectionRefused => -102,
            NetError::ConnectionAborted => -103,
            NetError::ConnectionFailed => -104,
            NetError::NameNotResolved => -105,
            NetError::NameNotResolvedFor { .. } => -105,
            NetError::InternetDisconnected => -106,
            NetError::AddressInvalid => -108,
            NetError::AddressUnreachable => -109,
            NetError::ConnectionTimedOut => -118,
            NetError::HostResolverQueueTooLarge => -119,
            NetError::ProxyConnectionFailed => -130,
            NetError::MandatoryProxyConfigurationFailed => -131,
            NetError::NameResolutionFailed => -137,
            NetError::NetworkAccessDenied => -138,

            NetError::InvalidUrl => -300,
            NetError::DisallowedUrlScheme => -301,
            NetError::UnknownUrlScheme => -302,
            NetError::PacScriptFailed => -327,
            NetError::NoSupportedProxies => -336,
            NetError::PacNotInDhcp => -348,
            NetError::PacScriptTerminated => -367,
            NetError::ProxyRequired => -368,
            NetError::Unknown(code) => *code,
        }
    }

    /// Attaches the failing hostname to an I/O error from a lookup.
    pub fn dns_failed(domain: &str, source: io::Error) -> Self {
        NetError::NameNotResolvedFor {
            domain: domain.to_string(),
            source: Arc::new(source),
        }
    }

    /// Converts a Chromium-style result code (`0` is `OK`) into a `Result`.
    pub fn check(code: i32) -> Result<(), NetError> {
        if code == 0 {
            Ok(())
        } else {
            Err(NetError::from(code))
        }
    }
}

impl PartialEq for NetError {
    fn eq(&self, other: &Self) -> bool {
        self.as_i32() == other.as_i32()
    }
}

impl Eq for NetError {}

impl From<i32> for NetError {
    fn from(code: i32) -> Self {
        match code {
            -2 => NetError::Failed,
            -3 => NetError::Aborted,
            -4 => NetError::InvalidArgument,
            -7 => NetError::TimedOut,
            -10 => NetError::AccessDenied,
            -11 => NetError::NotImplemented,
            -13 => NetError::OutOfMemory,

            -100 => NetError::ConnectionClosed,
            -101 => NetError::ConnectionReset,
            -102 => NetError::ConnectionRefused,
            -103 => NetError::ConnectionAborted,
            -104 => NetError::ConnectionFailed,
            -105 => NetError::NameNotResolved,
            -106 => NetError::InternetDisconnected,
            -108 => NetError::AddressInvalid,
            -109 => NetError::AddressUnreachable,
            -118 => NetError::ConnectionTimedOut,
            -119 => NetError::HostResolverQueueTooLarge,
            -130 => NetError::ProxyConnectionFailed,
            -131 => NetError::MandatoryProxyConfigurationFailed,
            -137 => NetError::NameResolutionFailed,
            -138 => NetError::NetworkAccessDenied,

            -300 => NetError::InvalidUrl,
            -301 => NetError::DisallowedUrlScheme,
            -302 => NetError::UnknownUrlScheme,
            -327 => NetError::PacScriptFailed,
            -336 => NetError::NoSupportedProxies,
            -348 => NetError::PacNotInDhcp,
            -367 => NetError::PacScriptTerminated,
            -368 => NetError::ProxyRequired,
            _ => NetError::Unknown(code),
        }
    }
}
