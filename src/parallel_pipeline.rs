// THEORY:
// The `parallel_pipeline` runs many independent analyses at once. A dispatcher task
// receives work over one unbounded channel and deals it round-robin to a fixed set of
// workers; each worker runs the synchronous pipeline on tokio's blocking pool and
// answers over a oneshot channel. Because the engine keeps no state between passes,
// every result is identical to what the sequential `RecolorPipeline` would produce.
//
// Large images take a second path: the raw buffer is cut into row bands, each band is
// simulated on its own blocking task, and the bands are stitched back in order.

use crate::core_modules::grouping::ColorSample;
use crate::core_modules::simulation::simulation::{DeficiencyType, Simulator};
use crate::core_modules::utils::image_helper::image_helper;
use crate::error::{EngineError, Result};
use crate::pipeline::{Analysis, RecolorPipeline};
use futures::future::join_all;
use image::RgbaImage;
use std::hash::Hash;
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};
use tracing::debug;

const MAX_WORKER_POOL_SIZE: usize = 16;

/// Worker count derived from the machine, clamped to [1, 16].
pub fn default_worker_count() -> usize {
    num_cpus::get().clamp(1, MAX_WORKER_POOL_SIZE)
}

pub struct AnalysisTask<H: Eq + Hash> {
    pub samples: Vec<ColorSample<H>>,
    pub result_sender: oneshot::Sender<Analysis<H>>,
}

pub struct WorkerPool<H: Eq + Hash> {
    task_sender: mpsc::UnboundedSender<AnalysisTask<H>>,
    workers: Vec<tokio::task::JoinHandle<()>>,
}

impl<H> WorkerPool<H>
where
    H: Clone + Eq + Hash + Send + 'static,
{
    /// Must be called from within a tokio runtime.
    pub fn new<S>(pipeline: Arc<RecolorPipeline<S>>, size: usize) -> Self
    where
        S: Simulator + Send + Sync + 'static,
    {
        let size = size.clamp(1, MAX_WORKER_POOL_SIZE);
        let (task_sender, mut task_receiver) = mpsc::unbounded_channel::<AnalysisTask<H>>();
        let mut workers = Vec::with_capacity(size + 1);

        // One dispatcher distributes tasks to the workers
        let (worker_senders, worker_receivers): (Vec<_>, Vec<_>) = (0..size)
            .map(|_| mpsc::unbounded_channel::<AnalysisTask<H>>())
            .unzip();

        workers.push(tokio::spawn(async move {
            let mut worker_idx = 0;
            while let Some(task) = task_receiver.recv().await {
                let _ = worker_senders[worker_idx].send(task);
                worker_idx = (worker_idx + 1) % size;
            }
        }));

        for (worker_id, mut worker_receiver) in worker_receivers.into_iter().enumerate() {
            let worker_pipeline = Arc::clone(&pipeline);

            let worker = tokio::spawn(async move {
                while let Some(task) = worker_receiver.recv().await {
                    let AnalysisTask {
                        samples,
                        result_sender,
                    } = task;
                    let task_pipeline = Arc::clone(&worker_pipeline);
                    let analysis =
                        tokio::task::spawn_blocking(move || task_pipeline.analyze(&samples)).await;

                    match analysis {
                        Ok(analysis) => {
                            let _ = result_sender.send(analysis);
                        }
                        // Dropping the sender tells the caller the task was lost.
                        Err(e) => debug!(worker_id, error = %e, "analysis task failed"),
                    }
                }
            });

            workers.push(worker);
        }

        Self {
            task_sender,
            workers,
        }
    }

    pub async fn analyze(&self, samples: Vec<ColorSample<H>>) -> Result<Analysis<H>> {
        let (result_sender, result_receiver) = oneshot::channel();

        let task = AnalysisTask {
            samples,
            result_sender,
        };

        self.task_sender
            .send(task)
            .map_err(|_| EngineError::WorkerUnavailable)?;

        result_receiver.await.map_err(|_| EngineError::WorkerDropped)
    }

    /// Number of analysis workers, not counting the dispatcher.
    pub fn size(&self) -> usize {
        self.workers.len().saturating_sub(1)
    }

    /// Stop accepting work and wait for in-flight tasks to finish.
    pub async fn shutdown(self) {
        drop(self.task_sender);
        for worker in self.workers {
            let _ = worker.await;
        }
    }
}

pub struct ParallelPipeline<H: Eq + Hash, S: Simulator> {
    pipeline: Arc<RecolorPipeline<S>>,
    worker_pool: WorkerPool<H>,
}

impl<H, S> ParallelPipeline<H, S>
where
    H: Clone + Eq + Hash + Send + 'static,
    S: Simulator + Send + Sync + 'static,
{
    pub fn new(pipeline: RecolorPipeline<S>) -> Self {
        Self::with_workers(pipeline, default_worker_count())
    }

    pub fn with_workers(pipeline: RecolorPipeline<S>, workers: usize) -> Self {
        let pipeline = Arc::new(pipeline);
        let worker_pool = WorkerPool::new(Arc::clone(&pipeline), workers);
        Self {
            pipeline,
            worker_pool,
        }
    }

    pub fn pipeline(&self) -> &RecolorPipeline<S> {
        &self.pipeline
    }

    pub fn workers(&self) -> usize {
        self.worker_pool.size()
    }

    pub async fn analyze(&self, samples: Vec<ColorSample<H>>) -> Result<Analysis<H>> {
        self.worker_pool.analyze(samples).await
    }

    /// Analyze independent sample sets concurrently. Results keep input order.
    pub async fn analyze_batches(&self, batches: Vec<Vec<ColorSample<H>>>) -> Result<Vec<Analysis<H>>> {
        let pending = batches
            .into_iter()
            .map(|samples| self.worker_pool.analyze(samples));
        join_all(pending).await.into_iter().collect()
    }

    /// Simulate `image` in row bands, one blocking task per band.
    pub async fn simulate_image(&self, image: &RgbaImage, ty: DeficiencyType) -> Result<RgbaImage> {
        let (width, height) = image.dimensions();
        if width == 0 || height == 0 {
            return Ok(image.clone());
        }

        let row_bytes = width as usize * image_helper::CHANNELS;
        let bands = self.workers().min(height as usize).max(1);
        let rows_per_band = (height as usize).div_ceil(bands);

        let tasks = image
            .as_raw()
            .chunks(rows_per_band * row_bytes)
            .map(|band| {
                let mut band = band.to_vec();
                let pipeline = Arc::clone(&self.pipeline);
                tokio::task::spawn_blocking(move || {
                    image_helper::simulate_pixels(&mut band, ty, pipeline.simulator());
                    band
                })
            });

        let mut buffer = Vec::with_capacity(image.as_raw().len());
        for band in join_all(tasks).await {
            buffer.extend(band.map_err(|_| EngineError::WorkerDropped)?);
        }

        stitch(width, height, buffer)
    }

    pub async fn shutdown(self) {
        self.worker_pool.shutdown().await;
    }
}

/// Rejoin simulated bands into an image of the original dimensions.
fn stitch(width: u32, height: u32, buffer: Vec<u8>) -> Result<RgbaImage> {
    let len = buffer.len();
    RgbaImage::from_raw(width, height, buffer).ok_or(EngineError::BufferSize { width, height, len })
}
