//! Base types and error handling.
//!
//! Provides foundational types mirroring Chromium's `net/base/` and `net/log/`:
//! - [`NetError`](neterror::NetError): Network error codes matching `net_error_list.h`
//! - [`LoadState`](loadstate::LoadState): Request loading states from `load_states_list.h`
//! - [`NetLog`](netlog::NetLog): Structured event sink
//! - [`CompletionOnceCallback`](completion::CompletionOnceCallback): Single-fire callbacks

pub mod completion;
pub mod context;
pub mod loadstate;
pub mod neterror;
pub mod netlog;
