//! Browser Rendering Engine
//!
//! A single shared Chrome process ([`BrowserManager`]) hands out one isolated
//! browsing context per request ([`PageSession`]). [`BrowserRenderer`] drives
//! a session through user-agent selection, intercepted navigation, the
//! scroll race, frame capture and in-page normalization.

pub mod interception;
pub mod launch;
pub mod manager;
pub mod renderer;
pub mod session;

pub use interception::{
    BlockReason, Decision, InterceptedRequest, InterceptionPolicy, InterceptionState,
    ResourceKind, SessionEvent, Stage,
};
pub use launch::{download_managed_browser, find_browser_executable, launch_browser};
pub use manager::BrowserManager;
pub use renderer::{BrowserRenderer, RenderOutcome, Renderer};
pub use session::PageSession;
