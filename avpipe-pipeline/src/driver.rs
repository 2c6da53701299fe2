//! Pipeline driver.
//!
//! Owns a set of sources feeding one shared muxer and runs them to
//! completion: prime every source, then step the unfinished ones round-robin
//! so no stream races ahead of the others, then close the muxer. If a step
//! fails the muxer is still closed best-effort before the error surfaces, so
//! whatever was written stays as valid as the container format allows.

use crate::mux::Muxer;
use crate::source::Source;
use crate::Result;
use std::cell::RefCell;
use std::rc::Rc;
use tracing::{debug, info, trace, warn};

/// Drives sources round-robin into a shared muxer.
pub struct PipelineDriver {
    sources: Vec<Box<dyn Source>>,
    muxer: Rc<RefCell<Muxer>>,
}

impl PipelineDriver {
    /// Create a driver over a shared muxer.
    pub fn new(muxer: Rc<RefCell<Muxer>>) -> Self {
        Self {
            sources: Vec::new(),
            muxer,
        }
    }

    /// Add a source to drive.
    pub fn add_source(&mut self, source: Box<dyn Source>) {
        self.sources.push(source);
    }

    /// Number of sources.
    pub fn num_sources(&self) -> usize {
        self.sources.len()
    }

    /// Prime every source.
    ///
    /// Priming steps each source until it has pushed output through its
    /// chain, which opens every output endpoint and lets the container
    /// header be written before free-running starts.
    pub fn prepare(&mut self) -> Result<()> {
        for source in &mut self.sources {
            debug!(source = %source.name(), "priming source");
            source.prepare()?;
        }
        info!(sources = self.sources.len(), "pipeline primed");
        Ok(())
    }

    /// Step every unfinished source once.
    ///
    /// Returns `false` once all sources are exhausted.
    pub fn step_round(&mut self) -> Result<bool> {
        let mut remaining = false;
        for source in &mut self.sources {
            if source.is_done() {
                continue;
            }
            trace!(source = %source.name(), "stepping source");
            source.step()?;
            if !source.is_done() {
                remaining = true;
            }
        }
        Ok(remaining)
    }

    /// Run all sources to completion and close the muxer.
    pub fn run(&mut self) -> Result<()> {
        if let Err(e) = self.drive() {
            // Close what we can so the container stays readable
            if let Err(close_err) = self.muxer.borrow_mut().close() {
                warn!(error = %close_err, "muxer close failed during error unwind");
            }
            return Err(e);
        }

        self.muxer.borrow_mut().close()?;
        info!("pipeline finished");
        Ok(())
    }

    fn drive(&mut self) -> Result<()> {
        self.prepare()?;
        while self.step_round()? {}
        Ok(())
    }
}
