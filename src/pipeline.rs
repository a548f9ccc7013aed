//! Pipelines: named tasks wired together by name and evaluated on demand.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::path::Path;
use std::sync::Arc;

use anyhow::Context;

use crate::{
    data::image::Image,
    foundation::error::{ImagecatError, ImagecatResult},
    observe::Observer,
    operator::{NamedInputs, Operator},
};

/// One task: an operator, its parameters, and the upstream task feeding each image input.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Task {
    pub op: Operator,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub params: BTreeMap<String, serde_json::Value>,
    /// Input name to upstream task name.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub inputs: BTreeMap<String, String>,
}

impl Task {
    pub fn new(op: Operator) -> Self {
        Self {
            op,
            params: BTreeMap::new(),
            inputs: BTreeMap::new(),
        }
    }

    pub fn param(
        mut self,
        name: impl Into<String>,
        value: impl serde::Serialize,
    ) -> ImagecatResult<Self> {
        let name = name.into();
        let value = serde_json::to_value(value).map_err(|e| {
            ImagecatError::validation(format!("parameter '{name}' cannot be serialized: {e}"))
        })?;
        self.params.insert(name, value);
        Ok(self)
    }

    pub fn input(mut self, name: impl Into<String>, task: impl Into<String>) -> Self {
        self.inputs.insert(name.into(), task.into());
        self
    }
}

/// A set of named tasks, as read from a pipeline document:
///
/// ```json
/// { "tasks": { "bg": { "op": "fill", "params": { "res": [256, 256] } },
///              "blur": { "op": "gaussian", "inputs": { "image": "bg" } } } }
/// ```
#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Pipeline {
    pub tasks: BTreeMap<String, Task>,
}

impl Pipeline {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_json(json: &str) -> ImagecatResult<Self> {
        serde_json::from_str(json)
            .map_err(|e| ImagecatError::format(format!("invalid pipeline document: {e}")))
    }

    pub fn from_path(path: impl AsRef<Path>) -> ImagecatResult<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("read pipeline '{}'", path.display()))?;
        Self::from_json(&json)
    }

    pub fn insert(&mut self, name: impl Into<String>, task: Task) -> &mut Self {
        self.tasks.insert(name.into(), task);
        self
    }

    /// Check that every input names an existing task, that no name is both a parameter and an
    /// input, and that the task graph has no cycles.
    pub fn validate(&self) -> ImagecatResult<()> {
        for (name, task) in &self.tasks {
            for (input, upstream) in &task.inputs {
                if !self.tasks.contains_key(upstream) {
                    return Err(ImagecatError::lookup(format!(
                        "task '{name}' input '{input}' refers to unknown task '{upstream}'"
                    )));
                }
                if task.params.contains_key(input) {
                    return Err(ImagecatError::validation(format!(
                        "task '{name}' names '{input}' as both a parameter and an input"
                    )));
                }
            }
        }

        let mut done = BTreeSet::new();
        for name in self.tasks.keys() {
            self.check_acyclic(name, &mut Vec::new(), &mut done)?;
        }
        Ok(())
    }

    fn check_acyclic<'a>(
        &'a self,
        name: &'a str,
        path: &mut Vec<&'a str>,
        done: &mut BTreeSet<&'a str>,
    ) -> ImagecatResult<()> {
        if done.contains(name) {
            return Ok(());
        }
        if path.contains(&name) {
            return Err(cycle_error(path, name));
        }
        path.push(name);
        if let Some(task) = self.tasks.get(name) {
            for upstream in task.inputs.values() {
                self.check_acyclic(upstream, path, done)?;
            }
        }
        path.pop();
        done.insert(name);
        Ok(())
    }

    /// Tasks whose output no other task consumes, in name order.
    pub fn sinks(&self) -> Vec<&str> {
        let consumed: BTreeSet<&str> = self
            .tasks
            .values()
            .flat_map(|t| t.inputs.values().map(String::as_str))
            .collect();
        self.tasks
            .keys()
            .map(String::as_str)
            .filter(|name| !consumed.contains(name))
            .collect()
    }

    pub fn evaluator(&self) -> Evaluator<'_> {
        Evaluator {
            pipeline: self,
            cache: HashMap::new(),
        }
    }
}

fn cycle_error(path: &[&str], name: &str) -> ImagecatError {
    let start = path.iter().position(|p| *p == name).unwrap_or(0);
    let mut cycle: Vec<&str> = path[start..].to_vec();
    cycle.push(name);
    ImagecatError::validation(format!("task cycle: {}", cycle.join(" -> ")))
}

/// Evaluates tasks of one [`Pipeline`], computing each task at most once.
pub struct Evaluator<'p> {
    pipeline: &'p Pipeline,
    cache: HashMap<String, Arc<Image>>,
}

impl Evaluator<'_> {
    /// Output of `task`, evaluating its upstream tasks first. Every newly computed output is
    /// reported to `observer`.
    pub fn evaluate(
        &mut self,
        task: &str,
        observer: &mut dyn Observer,
    ) -> ImagecatResult<Arc<Image>> {
        self.evaluate_inner(task, &mut Vec::new(), observer)
    }

    /// Whether `task` has already been computed.
    pub fn is_cached(&self, task: &str) -> bool {
        self.cache.contains_key(task)
    }

    fn evaluate_inner(
        &mut self,
        name: &str,
        path: &mut Vec<String>,
        observer: &mut dyn Observer,
    ) -> ImagecatResult<Arc<Image>> {
        if let Some(hit) = self.cache.get(name) {
            return Ok(hit.clone());
        }
        if path.iter().any(|p| p == name) {
            let path: Vec<&str> = path.iter().map(String::as_str).collect();
            return Err(cycle_error(&path, name));
        }
        let pipeline = self.pipeline;
        let task = pipeline
            .tasks
            .get(name)
            .ok_or_else(|| ImagecatError::lookup(format!("unknown task '{name}'")))?;

        path.push(name.to_string());
        let mut inputs = NamedInputs::new(name);
        for (param, value) in &task.params {
            inputs.insert(param.clone(), value.clone());
        }
        for (input, upstream) in &task.inputs {
            let image = self.evaluate_inner(upstream, path, observer)?;
            inputs.insert(input.clone(), image);
        }
        path.pop();

        let output = Arc::new(run_task(name, task.op, &inputs)?);
        observer.task_finished(name, task.op.name(), &output);
        self.cache.insert(name.to_string(), output.clone());
        Ok(output)
    }
}

#[tracing::instrument(skip(inputs))]
fn run_task(task: &str, op: Operator, inputs: &NamedInputs) -> ImagecatResult<Image> {
    op.run(inputs)
}
