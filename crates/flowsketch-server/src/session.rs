use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use log::info;

use flowsketch_core::canvas::{CanvasSnapshot, MemoryCanvas};
use flowsketch_core::{layout, sync};
use flowsketch_generate::{Flowchart, Orchestrator};

use crate::error::ServerError;

/// The live diagram and the generation cycles that replace it.
///
/// At most one cycle runs at a time; a request that arrives while another
/// is in flight is refused rather than queued. Canvas mutation happens
/// under its own lock, after generation has finished, and never awaits.
pub struct DiagramSession {
    orchestrator: Orchestrator,
    generating: AtomicBool,
    canvas: Mutex<MemoryCanvas>,
}

/// Marks a cycle as in flight until dropped, including when the request
/// future is cancelled mid-generation.
struct CycleGuard<'a>(&'a AtomicBool);

impl Drop for CycleGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl DiagramSession {
    pub fn new(orchestrator: Orchestrator) -> Self {
        Self {
            orchestrator,
            generating: AtomicBool::new(false),
            canvas: Mutex::new(MemoryCanvas::new()),
        }
    }

    /// Generate a flowchart for `text` and replace the canvas with it.
    ///
    /// On any failure the canvas keeps the previous diagram.
    pub async fn regenerate(&self, text: &str) -> Result<Flowchart, ServerError> {
        let _cycle = self.begin_cycle()?;

        let flowchart = self.orchestrator.generate_flowchart(text).await?;
        let layout = layout::layout(&flowchart.graph);

        let mut canvas = self.lock_canvas();
        sync::render(&layout.plan, &mut *canvas);
        info!(shapes = canvas.len(); "Canvas replaced");
        drop(canvas);

        Ok(flowchart)
    }

    pub fn is_generating(&self) -> bool {
        self.generating.load(Ordering::Acquire)
    }

    pub fn snapshot(&self) -> CanvasSnapshot {
        self.lock_canvas().snapshot()
    }

    fn begin_cycle(&self) -> Result<CycleGuard<'_>, ServerError> {
        self.generating
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map_err(|_| ServerError::Busy)?;
        Ok(CycleGuard(&self.generating))
    }

    // A panic mid-render cannot leave a mixed diagram: render always starts
    // with a full clear.
    fn lock_canvas(&self) -> MutexGuard<'_, MemoryCanvas> {
        self.canvas.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
