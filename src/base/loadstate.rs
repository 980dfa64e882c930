/// The current state of a pending proxy resolution.
/// Subset of net/base/load_states.h that the proxy resolution path reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LoadState {
    /// The request is idle.
    #[default]
    Idle,

    /// Waiting for the PAC script to decide on a proxy.
    ResolvingProxyForUrl,

    /// The PAC script is blocked on a `dnsResolve()` lookup.
    ResolvingHostInPacFile,
}
