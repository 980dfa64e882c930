//! Proxy decisions returned by a PAC script.
//!
//! A PAC script answers with a semicolon separated list such as
//! `"PROXY proxy.corp:8080; SOCKS5 socks.corp:1080; DIRECT"`. [`ProxyInfo`]
//! holds that list in order of preference.

use std::fmt;

/// Proxy protocol type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProxyScheme {
    /// No proxy, connect to the origin.
    Direct,
    /// HTTP proxy (CONNECT for HTTPS)
    Http,
    /// HTTPS proxy (TLS to proxy)
    Https,
    /// SOCKS4 proxy
    Socks4,
    /// SOCKS5 proxy
    Socks5,
    /// QUIC proxy
    Quic,
}

impl ProxyScheme {
    /// Maps a PAC result keyword to a scheme.
    pub fn from_pac_keyword(keyword: &str) -> Option<Self> {
        let scheme = match keyword.to_ascii_uppercase().as_str() {
            "DIRECT" => ProxyScheme::Direct,
            "PROXY" | "HTTP" => ProxyScheme::Http,
            "HTTPS" => ProxyScheme::Https,
            "SOCKS" | "SOCKS4" => ProxyScheme::Socks4,
            "SOCKS5" => ProxyScheme::Socks5,
            "QUIC" => ProxyScheme::Quic,
            _ => return None,
        };
        Some(scheme)
    }

    pub fn pac_keyword(self) -> &'static str {
        match self {
            ProxyScheme::Direct => "DIRECT",
            ProxyScheme::Http => "PROXY",
            ProxyScheme::Https => "HTTPS",
            ProxyScheme::Socks4 => "SOCKS",
            ProxyScheme::Socks5 => "SOCKS5",
            ProxyScheme::Quic => "QUIC",
        }
    }

    /// Port used when the PAC result leaves it out.
    pub fn default_port(self) -> u16 {
        match self {
            ProxyScheme::Direct => 0,
            ProxyScheme::Http => 80,
            ProxyScheme::Https | ProxyScheme::Quic => 443,
            ProxyScheme::Socks4 | ProxyScheme::Socks5 => 1080,
        }
    }
}

/// One entry of a PAC result.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ProxyServer {
    scheme: ProxyScheme,
    host: String,
    port: u16,
}

impl ProxyServer {
    pub fn direct() -> Self {
        Self {
            scheme: ProxyScheme::Direct,
            host: String::new(),
            port: 0,
        }
    }

    pub fn new(scheme: ProxyScheme, host: impl Into<String>, port: u16) -> Self {
        if scheme == ProxyScheme::Direct {
            return Self::direct();
        }
        Self {
            scheme,
            host: host.into(),
            port,
        }
    }

    /// Parses a single PAC entry such as `PROXY host:8080` or `DIRECT`.
    pub fn from_pac_entry(entry: &str) -> Option<Self> {
        let mut parts = entry.split_whitespace();
        let scheme = ProxyScheme::from_pac_keyword(parts.next()?)?;

        if scheme == ProxyScheme::Direct {
            return parts.next().is_none().then(Self::direct);
        }

        let host_port = parts.next()?;
        if parts.next().is_some() {
            return None;
        }
        let (host, port) = split_host_port(host_port, scheme.default_port())?;
        Some(Self::new(scheme, host, port))
    }

    pub fn scheme(&self) -> ProxyScheme {
        self.scheme
    }

    pub fn is_direct(&self) -> bool {
        self.scheme == ProxyScheme::Direct
    }

    /// Get proxy host and port. `None` for `DIRECT`.
    pub fn host_port(&self) -> Option<(&str, u16)> {
        (!self.is_direct()).then_some((self.host.as_str(), self.port))
    }

    pub fn to_pac_string(&self) -> String {
        if self.is_direct() {
            return "DIRECT".to_string();
        }
        if self.host.contains(':') {
            format!("{} [{}]:{}", self.scheme.pac_keyword(), self.host, self.port)
        } else {
            format!("{} {}:{}", self.scheme.pac_keyword(), self.host, self.port)
        }
    }
}

impl fmt::Display for ProxyServer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_pac_string())
    }
}

fn split_host_port(input: &str, default_port: u16) -> Option<(&str, u16)> {
    if let Some(rest) = input.strip_prefix('[') {
        let (host, tail) = rest.split_once(']')?;
        let port = match tail.strip_prefix(':') {
            Some(port) => port.parse().ok()?,
            None if tail.is_empty() => default_port,
            None => return None,
        };
        return (!host.is_empty()).then_some((host, port));
    }

    match input.rsplit_once(':') {
        Some((host, port)) if !host.contains(':') => {
            let port = port.parse().ok()?;
            (!host.is_empty()).then_some((host, port))
        }
        // Bare IPv6 literal without brackets.
        Some(_) => Some((input, default_port)),
        None => (!input.is_empty()).then_some((input, default_port)),
    }
}

/// The outcome of a proxy resolution: proxies to try, in order.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ProxyInfo {
    proxies: Vec<ProxyServer>,
}

impl ProxyInfo {
    /// A result that says to connect directly.
    pub fn direct() -> Self {
        Self {
            proxies: vec![ProxyServer::direct()],
        }
    }

    pub fn from_proxies(proxies: Vec<ProxyServer>) -> Self {
        Self { proxies }
    }

    /// Parses the return value of `FindProxyForURL()`.
    ///
    /// Malformed entries are skipped. A result with no usable entry falls back
    /// to `DIRECT`, which is what a broken PAC script gets in Chromium too.
    pub fn from_pac_string(pac: &str) -> Self {
        let proxies: Vec<ProxyServer> = pac
            .split(';')
            .map(str::trim)
            .filter(|entry| !entry.is_empty())
            .filter_map(|entry| {
                let server = ProxyServer::from_pac_entry(entry);
                if server.is_none() {
                    tracing::debug!(entry = %entry, "skipping malformed PAC entry");
                }
                server
            })
            .collect();

        if proxies.is_empty() {
            Self::direct()
        } else {
            Self { proxies }
        }
    }

    pub fn to_pac_string(&self) -> String {
        self.proxies
            .iter()
            .map(ProxyServer::to_pac_string)
            .collect::<Vec<_>>()
            .join(";")
    }

    /// The preferred proxy, if any.
    pub fn proxy_server(&self) -> Option<&ProxyServer> {
        self.proxies.first()
    }

    pub fn proxies(&self) -> &[ProxyServer] {
        &self.proxies
    }

    /// True if the preferred choice is to go direct.
    pub fn is_direct(&self) -> bool {
        self.proxy_server().is_some_and(ProxyServer::is_direct)
    }

    pub fn is_empty(&self) -> bool {
        self.proxies.is_empty()
    }
}

impl fmt::Display for ProxyInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_pac_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_direct() {
        let info = ProxyInfo::from_pac_string("DIRECT");
        assert!(info.is_direct());
        assert_eq!(info.to_pac_string(), "DIRECT");
    }

    #[test]
    fn test_parse_list_keeps_order() {
        let info =
            ProxyInfo::from_pac_string("PROXY proxy.corp:8080; SOCKS5 socks.corp; DIRECT");

        let proxies = info.proxies();
        assert_eq!(proxies.len(), 3);
        assert_eq!(proxies[0].scheme(), ProxyScheme::Http);
        assert_eq!(proxies[0].host_port(), Some(("proxy.corp", 8080)));
        assert_eq!(proxies[1].scheme(), ProxyScheme::Socks5);
        assert_eq!(proxies[1].host_port(), Some(("socks.corp", 1080)));
        assert!(proxies[2].is_direct());
        assert!(!info.is_direct());
        assert_eq!(
            info.to_pac_string(),
            "PROXY proxy.corp:8080;SOCKS5 socks.corp:1080;DIRECT"
        );
    }

    #[test]
    fn test_keywords_are_case_insensitive() {
        let info = ProxyInfo::from_pac_string("https secure.corp:8443;socks legacy:1081");
        assert_eq!(info.proxies()[0].scheme(), ProxyScheme::Https);
        assert_eq!(info.proxies()[1].scheme(), ProxyScheme::Socks4);
    }

    #[test]
    fn test_ipv6_hosts() {
        let server = ProxyServer::from_pac_entry("PROXY [2001:db8::1]:3128").unwrap();
        assert_eq!(server.host_port(), Some(("2001:db8::1", 3128)));
        assert_eq!(server.to_pac_string(), "PROXY [2001:db8::1]:3128");

        let bare = ProxyServer::from_pac_entry("HTTPS [::1]").unwrap();
        assert_eq!(bare.host_port(), Some(("::1", 443)));
    }

    #[test]
    fn test_malformed_entries_are_skipped() {
        let info = ProxyInfo::from_pac_string("BOGUS x:1; PROXY :80; PROXY good:81; DIRECT extra");
        assert_eq!(info.proxies(), &[ProxyServer::new(ProxyScheme::Http, "good", 81)]);
    }

    #[test]
    fn test_unparseable_result_falls_back_to_direct() {
        assert!(ProxyInfo::from_pac_string("").is_direct());
        assert!(ProxyInfo::from_pac_string("nonsense").is_direct());
    }
}
