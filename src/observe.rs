use crate::data::image::Image;

/// Receives every task output produced during pipeline evaluation.
///
/// Observers are a side channel: they see outputs after they are computed and cannot change
/// them. Outputs are reported in evaluation order, dependencies first.
pub trait Observer {
    fn task_finished(&mut self, task: &str, operator: &str, output: &Image);
}

/// Logs a one-line summary of each output through `tracing`.
#[derive(Clone, Copy, Debug, Default)]
pub struct TracingObserver;

impl Observer for TracingObserver {
    fn task_finished(&mut self, task: &str, operator: &str, output: &Image) {
        tracing::info!(task, operator, output = ?output, "task finished");
    }
}

/// Discards every output.
#[derive(Clone, Copy, Debug, Default)]
pub struct NullObserver;

impl Observer for NullObserver {
    fn task_finished(&mut self, _task: &str, _operator: &str, _output: &Image) {}
}

/// Keeps the name of every finished task, in order. Useful in tests.
#[derive(Clone, Debug, Default)]
pub struct RecordingObserver {
    pub(crate) finished: Vec<String>,
}

impl RecordingObserver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn finished(&self) -> &[String] {
        &self.finished
    }
}

impl Observer for RecordingObserver {
    fn task_finished(&mut self, task: &str, _operator: &str, _output: &Image) {
        self.finished.push(task.to_string());
    }
}
