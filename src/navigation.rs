//! Navigation state owner: the single source of truth for the active view.
//!
//! `navigate` is total and unconditional. Flow controllers scoped to a view
//! attach a `ViewLifecycle` hook; when the active view changes, the hooks of
//! the view being left run `on_exit` before the hooks of the entered view run
//! `on_enter`. Hooks are held weakly so a controller that owns an
//! `Arc<Navigator>` does not form a cycle with it.

use std::sync::{Arc, PoisonError, RwLock, Weak};

use crate::models::View;

/// Enter/exit hooks for state scoped to one view's lifetime.
pub trait ViewLifecycle: Send + Sync {
    fn on_enter(&self) {}
    fn on_exit(&self) {}
}

pub struct Navigator {
    current: RwLock<View>,
    hooks: RwLock<Vec<(View, Weak<dyn ViewLifecycle>)>>,
}

impl Navigator {
    /// Start on the landing page.
    pub fn new() -> Self {
        Self::starting_at(View::default())
    }

    pub fn starting_at(view: View) -> Self {
        Self {
            current: RwLock::new(view),
            hooks: RwLock::new(Vec::new()),
        }
    }

    pub fn current_view(&self) -> View {
        *self.current.read().unwrap_or_else(PoisonError::into_inner)
    }

    /// Replace the active view with `target`.
    ///
    /// Navigating to the view already active leaves it in place and runs no
    /// hooks.
    pub fn navigate(&self, target: View) {
        let previous = {
            let mut current = self.current.write().unwrap_or_else(PoisonError::into_inner);
            std::mem::replace(&mut *current, target)
        };

        if previous == target {
            tracing::debug!(view = %target, "Navigate to current view, nothing to do");
            return;
        }
        tracing::info!(from = %previous, to = %target, "Navigate");

        // Hooks run without any navigator lock held: they may read the
        // current view or drop timers.
        let (leaving, entering) = {
            let hooks = self.hooks.read().unwrap_or_else(PoisonError::into_inner);
            let collect = |view: View| -> Vec<Arc<dyn ViewLifecycle>> {
                hooks
                    .iter()
                    .filter(|(v, _)| *v == view)
                    .filter_map(|(_, hook)| hook.upgrade())
                    .collect()
            };
            (collect(previous), collect(target))
        };

        for hook in leaving {
            hook.on_exit();
        }
        for hook in entering {
            hook.on_enter();
        }
    }

    /// Register `hook` for `view`. Hooks whose owner has been dropped are
    /// pruned here.
    pub fn attach<H: ViewLifecycle + 'static>(&self, view: View, hook: &Arc<H>) {
        let weak = Arc::downgrade(hook);
        let weak: Weak<dyn ViewLifecycle> = weak;
        let mut hooks = self.hooks.write().unwrap_or_else(PoisonError::into_inner);
        hooks.retain(|(_, h)| h.strong_count() > 0);
        hooks.push((view, weak));
        tracing::debug!(%view, hooks = hooks.len(), "Lifecycle hook attached");
    }

    /// Number of live hooks attached to `view`.
    pub fn hook_count(&self, view: View) -> usize {
        self.hooks
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter(|(v, h)| *v == view && h.strong_count() > 0)
            .count()
    }
}

impl Default for Navigator {
    fn default() -> Self {
        Self::new()
    }
}
