//! services/dispatch_tracker.rs
//! Lanza los despachos como tareas independientes y lleva la cuenta de las
//! que siguen en curso, para drenarlas al apagar el proceso.

use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::runtime::Handle;
use tokio::sync::Notify;

#[derive(Debug, Default)]
struct InFlight {
    count: AtomicUsize,
    idle: Notify,
}

/// Decrementa el contador al terminar (o cancelarse) la tarea.
struct InFlightGuard(Arc<InFlight>);

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        if self.0.count.fetch_sub(1, Ordering::AcqRel) == 1 {
            self.0.idle.notify_waiters();
        }
    }
}

#[derive(Clone)]
pub struct DispatchTracker {
    runtime: Handle,
    in_flight: Arc<InFlight>,
}

impl DispatchTracker {
    /// Las tareas se lanzan sobre `runtime`, no sobre el runtime local del
    /// worker de actix que atiende el request.
    pub fn new(runtime: Handle) -> Self {
        DispatchTracker {
            runtime,
            in_flight: Arc::new(InFlight::default()),
        }
    }

    /// Lanza `task` sin esperar su resultado; el que llama no recibe handle.
    pub fn spawn<F>(&self, task: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        self.in_flight.count.fetch_add(1, Ordering::AcqRel);
        let guard = InFlightGuard(self.in_flight.clone());

        self.runtime.spawn(async move {
            let _guard = guard;
            task.await;
        });
    }

    pub fn in_flight(&self) -> usize {
        self.in_flight.count.load(Ordering::Acquire)
    }

    /// Espera hasta `grace` a que no queden despachos en curso.
    /// Devuelve `true` si se drenaron todos.
    pub async fn wait_idle(&self, grace: Duration) -> bool {
        let drained = async {
            loop {
                let notified = self.in_flight.idle.notified();
                if self.in_flight() == 0 {
                    return;
                }
                notified.await;
            }
        };
        tokio::time::timeout(grace, drained).await.is_ok()
    }
}
