// THEORY:
// A camera produces frames far faster than anyone needs a new palette. The
// `PaletteService` sits between a frame source and the UI and does three things:
// it throttles processing to one frame per interval, it always works on the
// newest frame available (stale frames are dropped, never queued), and it keeps
// the CPU-heavy quantization off the async executor.
//
// Key architectural principles:
// 1.  **Latest Value Wins**: Frames travel through a `watch` channel. Submitting a
//     frame overwrites whatever the worker has not picked up yet, so a slow
//     quantizer can never build a backlog.
// 2.  **Single Writer**: Exactly one worker task owns the `PalettePipeline`. For each
//     frame the pipeline is moved into `spawn_blocking` and moved back out with the
//     result, so the stabilizer's previous palette has one owner and needs no lock.
// 3.  **Observers Pull**: Palettes are republished on a second `watch` channel.
//     Observers read the latest value, await changes, or consume a `Stream`.
// 4.  **Cooperative Shutdown**: Dropping the submit side ends the worker once it has
//     finished the frame in hand.

use crate::config::ServiceConfig;
use crate::core_modules::algorithms::PaletteAlgorithm;
use crate::error::{PaletteError, Result};
use crate::pipeline::{PalettePipeline, PipelineConfig, Report};
use futures::{Stream, StreamExt, stream};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{Instant, Interval, MissedTickBehavior};
use tracing::{debug, error, info, trace};

pub use crate::core_modules::color::color::RgbColor;
pub use crate::core_modules::frame::frame::Frame;

/// Handle to a running palette worker.
#[derive(Debug)]
pub struct PaletteService {
    frame_sender: watch::Sender<Option<Arc<Frame>>>,
    palette_receiver: watch::Receiver<Vec<RgbColor>>,
    worker: JoinHandle<()>,
}

impl PaletteService {
    /// Starts the worker task on the current tokio runtime.
    pub fn spawn<A>(pipeline: PalettePipeline<A>, throttle_interval: Duration) -> Self
    where
        A: PaletteAlgorithm + 'static,
    {
        let (frame_sender, frame_receiver) = watch::channel(None);
        let (palette_sender, palette_receiver) = watch::channel(Vec::new());

        info!(
            algorithm = pipeline.algorithm_name(),
            throttle_ms = throttle_interval.as_millis() as u64,
            "Starting palette service"
        );
        let worker = tokio::spawn(run_worker(
            pipeline,
            frame_receiver,
            palette_sender,
            throttle_interval,
        ));

        Self {
            frame_sender,
            palette_receiver,
            worker,
        }
    }

    /// Builds the pipeline described by `config` and starts it.
    pub fn from_config(config: &ServiceConfig) -> Result<Self> {
        let pipeline = PalettePipeline::new(PipelineConfig::from(config))?;
        Ok(Self::spawn(pipeline, config.throttle_interval))
    }

    /// Hands a frame to the worker, replacing any frame it has not started yet.
    pub fn submit(&self, frame: Frame) -> Result<()> {
        self.frame_sender
            .send(Some(Arc::new(frame)))
            .map_err(|_| PaletteError::Worker {
                message: "palette worker is no longer running".to_string(),
            })
    }

    /// Submits every frame a source yields, until it ends.
    pub async fn drive<S>(&self, frames: S) -> Result<()>
    where
        S: Stream<Item = Frame>,
    {
        let mut frames = std::pin::pin!(frames);
        while let Some(frame) = frames.next().await {
            self.submit(frame)?;
        }
        Ok(())
    }

    /// A receiver that is notified on every published palette.
    pub fn subscribe(&self) -> watch::Receiver<Vec<RgbColor>> {
        self.palette_receiver.clone()
    }

    /// The most recent palette; empty until the first frame has been processed.
    pub fn latest_palette(&self) -> Vec<RgbColor> {
        self.palette_receiver.borrow().clone()
    }

    /// Palettes published from now on. Ends when the worker stops.
    pub fn palette_stream(&self) -> impl Stream<Item = Vec<RgbColor>> + Send + 'static {
        stream::unfold(self.subscribe(), |mut receiver| async move {
            receiver.changed().await.ok()?;
            let palette = receiver.borrow_and_update().clone();
            Some((palette, receiver))
        })
    }

    /// Stops accepting frames and waits for the worker to exit.
    pub async fn shutdown(self) -> Result<()> {
        let Self {
            frame_sender,
            worker,
            ..
        } = self;
        drop(frame_sender);
        worker.await.map_err(|e| PaletteError::Worker {
            message: e.to_string(),
        })
    }
}

async fn run_worker<A>(
    mut pipeline: PalettePipeline<A>,
    mut frames: watch::Receiver<Option<Arc<Frame>>>,
    palettes: watch::Sender<Vec<RgbColor>>,
    throttle_interval: Duration,
) where
    A: PaletteAlgorithm + 'static,
{
    while frames.changed().await.is_ok() {
        let accepted_at = Instant::now();
        let Some(frame) = frames.borrow_and_update().clone() else {
            continue;
        };

        let result = tokio::task::spawn_blocking(move || {
            let report = pipeline.process_frame(&frame);
            (pipeline, report)
        })
        .await;

        let report = match result {
            Ok((returned, report)) => {
                pipeline = returned;
                report
            }
            Err(err) => {
                error!(%err, "Palette worker task failed");
                return;
            }
        };

        match report {
            Report::PaletteUpdated(data) => {
                palettes.send_replace(data.colors);
            }
            Report::NoPaletteUpdate => trace!("No palette for this frame"),
        }

        tokio::time::sleep_until(accepted_at + throttle_interval).await;
    }
    debug!("Frame sender dropped, palette worker exiting");
}

/// Emits clones of one frame at a fixed rate, forever.
pub fn repeating_source(frame: Frame, fps: u32) -> impl Stream<Item = Frame> + Send + 'static {
    let period = Duration::from_secs(1) / fps.max(1);
    // The interval is created on first poll so the source can be built outside a runtime.
    stream::unfold(None::<Interval>, move |ticker| {
        let frame = frame.clone();
        async move {
            let mut ticker = ticker.unwrap_or_else(|| {
                let mut ticker = tokio::time::interval(period);
                ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
                ticker
            });
            ticker.tick().await;
            Some((frame, Some(ticker)))
        }
    })
}

/// A camera stand-in that shows a single color.
pub fn solid_color_source(
    color: RgbColor,
    width: usize,
    height: usize,
    fps: u32,
) -> impl Stream<Item = Frame> + Send + 'static {
    repeating_source(Frame::solid(color, width, height), fps)
}
