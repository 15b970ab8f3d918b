use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::time::Instant;

use rayon::prelude::*;
use tracing::{debug, info, trace};

use panbrot_core::{escape_time, Complex};

use crate::buffer::PixelBuffer;
use crate::color::colorize_rgba;
use crate::rect::PixelRect;

// ---------------------------------------------------------------------------
// Generation counter
// ---------------------------------------------------------------------------

/// The live render generation plus progress for the newest render.
///
/// Starting a render advances the generation; any job stamped with an older
/// value stops at its next slice boundary.
#[derive(Debug)]
pub struct RenderGeneration {
    generation: AtomicU64,
    progress_done: AtomicUsize,
    progress_total: AtomicUsize,
}

impl RenderGeneration {
    pub fn new() -> Self {
        Self {
            generation: AtomicU64::new(0),
            progress_done: AtomicUsize::new(0),
            progress_total: AtomicUsize::new(0),
        }
    }

    /// Supersede every in-flight job and return the new generation.
    pub fn advance(&self) -> u64 {
        self.generation.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Read the current generation.
    pub fn current(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }

    /// Reset progress for a new render of `total` pixels.
    pub fn reset_progress(&self, total: usize) {
        self.progress_total.store(total, Ordering::Relaxed);
        self.progress_done.store(0, Ordering::Relaxed);
    }

    pub fn add_progress(&self, pixels: usize) {
        self.progress_done.fetch_add(pixels, Ordering::Relaxed);
    }

    /// Read the current progress as `(done, total)` pixels.
    pub fn progress(&self) -> (usize, usize) {
        (
            self.progress_done.load(Ordering::Relaxed),
            self.progress_total.load(Ordering::Relaxed),
        )
    }
}

impl Default for RenderGeneration {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// Pixel mapping
// ---------------------------------------------------------------------------

/// Maps pixels of one buffer onto the plane.
///
/// The buffer's own middle is the pixel origin and `center` is the plane
/// origin, so coordinates stay consistent however the visible viewport is
/// placed inside the buffer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlaneMapping {
    pub center: Complex,
    /// Plane units per pixel.
    pub scale: f64,
    pub half_width: f64,
    pub half_height: f64,
}

impl PlaneMapping {
    pub fn new(center: Complex, scale: f64, buffer_width: u32, buffer_height: u32) -> Self {
        Self {
            center,
            scale,
            half_width: buffer_width as f64 / 2.0,
            half_height: buffer_height as f64 / 2.0,
        }
    }

    #[inline]
    pub fn pixel_to_complex(&self, px: u32, py: u32) -> Complex {
        Complex::new(
            (px as f64 - self.half_width) * self.scale + self.center.re,
            (py as f64 - self.half_height) * self.scale + self.center.im,
        )
    }
}

/// Evaluate and color every pixel of `rect`, then write it into `buffer`.
///
/// Rows are evaluated in parallel; the call returns once the whole
/// rectangle is written.
pub fn compute_rect(
    buffer: &mut PixelBuffer,
    rect: &PixelRect,
    mapping: &PlaneMapping,
    max_iter: u32,
) {
    if rect.is_empty() {
        return;
    }
    let row_bytes = rect.width as usize * 4;
    let mut rgba = vec![0u8; rect.pixel_count() * 4];

    rgba.par_chunks_mut(row_bytes)
        .enumerate()
        .for_each(|(j, row)| {
            let py = rect.y + j as u32;
            for (i, pixel) in row.chunks_exact_mut(4).enumerate() {
                let c = mapping.pixel_to_complex(rect.x + i as u32, py);
                pixel.copy_from_slice(&colorize_rgba(&escape_time(c, max_iter), max_iter));
            }
        });

    buffer.write_rect(rect, &rgba);
}

// ---------------------------------------------------------------------------
// Chunked jobs
// ---------------------------------------------------------------------------

/// What happened during one [`RenderJob::step`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SliceOutcome {
    /// A slice was written and more work is queued.
    Continue,
    /// The queue is drained.
    Finished,
    /// A newer generation started; nothing further will be written.
    Superseded,
}

/// A queue of rectangles drained a bounded number of rows at a time.
///
/// Each call to [`step`](Self::step) computes at most `rows_per_slice` rows
/// of the front rectangle and then hands control back, so the caller can
/// schedule the next slice on its next frame.
#[derive(Debug)]
pub struct RenderJob {
    generation: u64,
    queue: VecDeque<PixelRect>,
    mapping: PlaneMapping,
    max_iter: u32,
    rows_per_slice: u32,
    started: Instant,
    slices: usize,
    pixels: usize,
}

impl RenderJob {
    /// Advance the live generation and stamp a new job with it.
    ///
    /// Rectangles are computed in the order given; empty ones are dropped.
    pub fn start(
        live: &RenderGeneration,
        rects: impl IntoIterator<Item = PixelRect>,
        mapping: PlaneMapping,
        max_iter: u32,
        rows_per_slice: u32,
    ) -> Self {
        let queue: VecDeque<PixelRect> = rects.into_iter().filter(|r| !r.is_empty()).collect();
        let total: usize = queue.iter().map(PixelRect::pixel_count).sum();
        let generation = live.advance();
        live.reset_progress(total);
        debug!(
            generation,
            rects = queue.len(),
            pixels = total,
            max_iter,
            "Starting chunked render"
        );
        Self {
            generation,
            queue,
            mapping,
            max_iter,
            rows_per_slice: rows_per_slice.max(1),
            started: Instant::now(),
            slices: 0,
            pixels: 0,
        }
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn is_finished(&self) -> bool {
        self.queue.is_empty()
    }

    /// Rectangles (or the unfinished parts of them) still to be computed.
    pub fn remaining(&self) -> impl Iterator<Item = &PixelRect> {
        self.queue.iter()
    }

    /// Compute one slice, then call `on_progress` with the updated buffer.
    ///
    /// The live generation is checked before and after the slice; a stale
    /// job returns [`SliceOutcome::Superseded`] without reporting progress.
    pub fn step<F>(
        &mut self,
        buffer: &mut PixelBuffer,
        live: &RenderGeneration,
        mut on_progress: F,
    ) -> SliceOutcome
    where
        F: FnMut(&PixelBuffer),
    {
        if live.current() != self.generation {
            debug!(generation = self.generation, "Render superseded");
            return SliceOutcome::Superseded;
        }

        let Some(front) = self.queue.front_mut() else {
            return SliceOutcome::Finished;
        };
        let slice = front.take_rows(self.rows_per_slice);
        if front.is_empty() {
            self.queue.pop_front();
        }
        let Some(slice) = slice else {
            return self.finish_or_continue();
        };

        compute_rect(buffer, &slice, &self.mapping, self.max_iter);
        self.slices += 1;
        self.pixels += slice.pixel_count();

        if live.current() != self.generation {
            debug!(generation = self.generation, "Render superseded mid-slice");
            return SliceOutcome::Superseded;
        }

        live.add_progress(slice.pixel_count());
        trace!(
            generation = self.generation,
            y = slice.y,
            rows = slice.height,
            "Slice computed"
        );
        on_progress(buffer);

        self.finish_or_continue()
    }

    /// Drive [`step`](Self::step) until the job finishes or is superseded.
    pub fn run_to_completion<F>(
        &mut self,
        buffer: &mut PixelBuffer,
        live: &RenderGeneration,
        mut on_progress: F,
    ) -> SliceOutcome
    where
        F: FnMut(&PixelBuffer),
    {
        loop {
            match self.step(buffer, live, &mut on_progress) {
                SliceOutcome::Continue => continue,
                done => return done,
            }
        }
    }

    fn finish_or_continue(&self) -> SliceOutcome {
        if !self.queue.is_empty() {
            return SliceOutcome::Continue;
        }
        info!(
            generation = self.generation,
            elapsed_ms = self.started.elapsed().as_millis(),
            slices = self.slices,
            pixels = self.pixels,
            "Render complete"
        );
        SliceOutcome::Finished
    }
}
