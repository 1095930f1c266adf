//! Named lifecycle events with synchronously invoked handlers.

use std::collections::BTreeMap;

use tracing::warn;

pub const PRE_RESOLVE: &str = "pre-resolve";
pub const POST_RESOLVE: &str = "post-resolve";
pub const PRE_INSTALL: &str = "pre-install";
pub const POST_INSTALL: &str = "post-install";
pub const PRE_LOAD: &str = "pre-load";
pub const POST_LOAD: &str = "post-load";
pub const READY: &str = "ready";
pub const PACKAGE_DISABLED: &str = "package-disabled";

/// What a handler gets to see when an event fires.
#[derive(Debug, Clone, Copy)]
pub struct HookContext<'a> {
    pub event: &'a str,
    /// Package the event refers to; `None` for pipeline-wide events.
    pub package: Option<&'a str>,
}

type Handler = Box<dyn Fn(&HookContext<'_>) -> anyhow::Result<()> + Send>;

struct Hook {
    name: String,
    handler: Handler,
}

/// Publish/subscribe bus keyed by event name.
///
/// Handlers are identified by name so they can be removed and so duplicate
/// registrations replace the previous one instead of stacking.
#[derive(Default)]
pub struct Hooks {
    handlers: BTreeMap<String, Vec<Hook>>,
}

impl Hooks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `handler` under `name` for `event`. Re-registering the same
    /// name replaces the existing handler, keeping its position.
    pub fn on<F>(&mut self, event: &str, name: &str, handler: F)
    where
        F: Fn(&HookContext<'_>) -> anyhow::Result<()> + Send + 'static,
    {
        let hooks = self.handlers.entry(event.to_string()).or_default();
        let hook = Hook {
            name: name.to_string(),
            handler: Box::new(handler),
        };
        match hooks.iter_mut().find(|h| h.name == name) {
            Some(existing) => *existing = hook,
            None => hooks.push(hook),
        }
    }

    pub fn off(&mut self, event: &str, name: &str) {
        if let Some(hooks) = self.handlers.get_mut(event) {
            hooks.retain(|h| h.name != name);
        }
    }

    /// Invoke handlers in registration order. A failing handler is logged
    /// and the remaining handlers still run.
    pub fn fire(&self, event: &str, package: Option<&str>) {
        let Some(hooks) = self.handlers.get(event) else {
            return;
        };
        let context = HookContext { event, package };
        for hook in hooks {
            if let Err(e) = (hook.handler)(&context) {
                warn!("hook handler `{}` failed on {event}: {e:?}", hook.name);
            }
        }
    }
}

impl std::fmt::Debug for Hooks {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut map = f.debug_map();
        for (event, hooks) in &self.handlers {
            map.entry(event, &hooks.iter().map(|h| &h.name).collect::<Vec<_>>());
        }
        map.finish()
    }
}
