//! Bounded-concurrency DAG-of-stages executor.
//!
//! Generalizes the same concurrency shape used by a DAG scheduler over
//! HTTP steps) from "steps with executors" to "named stages with async
//! stage functions" — same concurrency shape (`Arc<RwLock>` for completed
//! outputs, `Semaphore` for the parallelism cap, `JoinSet` for in-flight
//! work), generalized to the orchestrator's
//! `bootstrap → analyze → prd → {frontend_plan, backend_plan, security_plan}
//! → join_plans` branch-and-join shape. The iterative
//! `execute ⇄ fix_tests` retry loop that follows is not a DAG (it can revisit
//! the same stage) and is deliberately driven by a plain loop in
//! `orchestrator::mod` instead of being forced into this graph.

use anyhow::{anyhow, Result};
use serde_json::Value;
use std::collections::{HashMap, HashSet};
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use tokio::sync::{RwLock, Semaphore};
use tokio::task::JoinSet;

type BoxFuture<T> = Pin<Box<dyn Future<Output = T> + Send>>;
type StageFn = Arc<dyn Fn(HashMap<String, Value>) -> BoxFuture<Result<Value>> + Send + Sync>;

struct StageSpec {
    name: String,
    depends_on: Vec<String>,
    f: StageFn,
}

/// A named DAG of async stages. Each stage receives the JSON outputs of its
/// declared dependencies and produces its own.
#[derive(Default)]
pub struct StageGraph {
    stages: Vec<StageSpec>,
}

impl StageGraph {
    pub fn new() -> Self {
        Self { stages: Vec::new() }
    }

    pub fn add_stage<F, Fut>(&mut self, name: impl Into<String>, depends_on: &[&str], f: F)
    where
        F: Fn(HashMap<String, Value>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Value>> + Send + 'static,
    {
        self.stages.push(StageSpec {
            name: name.into(),
            depends_on: depends_on.iter().map(|s| s.to_string()).collect(),
            f: Arc::new(move |inputs| Box::pin(f(inputs))),
        });
    }

    /// Runs every stage once its dependencies are satisfied, never exceeding
    /// `max_concurrency` in-flight stages. Returns the first error
    /// encountered (a failing stage aborts the whole graph, matching
    /// a failing stage fails the whole run.
    pub async fn run(&self, max_concurrency: usize) -> Result<HashMap<String, Value>> {
        let outputs: Arc<RwLock<HashMap<String, Value>>> = Arc::new(RwLock::new(HashMap::new()));
        let semaphore = Arc::new(Semaphore::new(max_concurrency.max(1)));
        let mut remaining: HashMap<String, &StageSpec> = self.stages.iter().map(|s| (s.name.clone(), s)).collect();
        let mut started: HashSet<String> = HashSet::new();
        let mut in_flight: JoinSet<(String, Result<Value>)> = JoinSet::new();

        loop {
            if remaining.is_empty() && in_flight.is_empty() {
                break;
            }

            let completed_keys: HashSet<String> = outputs.read().await.keys().cloned().collect();
            let ready: Vec<String> = remaining
                .iter()
                .filter(|(name, spec)| !started.contains(*name) && spec.depends_on.iter().all(|d| completed_keys.contains(d)))
                .map(|(name, _)| name.clone())
                .collect();

            for name in ready {
                started.insert(name.clone());
                let spec = remaining[&name];
                let f = spec.f.clone();
                let deps = spec.depends_on.clone();
                let outputs_clone = outputs.clone();
                let sem = semaphore.clone();
                in_flight.spawn(async move {
                    let _permit = sem.acquire_owned().await.expect("stage semaphore closed early");
                    let inputs: HashMap<String, Value> = {
                        let snapshot = outputs_clone.read().await;
                        deps.iter().filter_map(|d| snapshot.get(d).cloned().map(|v| (d.clone(), v))).collect()
                    };
                    let result = (f)(inputs).await;
                    (name, result)
                });
            }

            if in_flight.is_empty() {
                let stuck: Vec<&String> = remaining.keys().collect();
                return Err(anyhow!("stage graph stalled: unmet dependencies for {stuck:?}"));
            }

            let (name, result) = in_flight.join_next().await.expect("in_flight checked non-empty")?;
            match result {
                Ok(value) => {
                    outputs.write().await.insert(name.clone(), value);
                    remaining.remove(&name);
                }
                Err(e) => return Err(e.context(format!("stage '{name}' failed"))),
            }
        }

        Ok(Arc::try_unwrap(outputs).map_err(|_| anyhow!("stage outputs still shared after graph completion")).map(|lock| lock.into_inner())?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn runs_independent_stages_and_joins_on_a_dependent_one() {
        let mut graph = StageGraph::new();
        graph.add_stage("a", &[], |_| async { Ok(json!(1)) });
        graph.add_stage("b", &[], |_| async { Ok(json!(2)) });
        graph.add_stage("join", &["a", "b"], |inputs| async move {
            let sum = inputs["a"].as_i64().unwrap() + inputs["b"].as_i64().unwrap();
            Ok(json!(sum))
        });

        let outputs = graph.run(4).await.unwrap();
        assert_eq!(outputs["join"], json!(3));
    }

    #[tokio::test]
    async fn a_failing_stage_aborts_the_graph() {
        let mut graph = StageGraph::new();
        graph.add_stage("boom", &[], |_| async { Err(anyhow!("exploded")) });
        graph.add_stage("never", &["boom"], |_| async { Ok(json!("unreachable")) });

        let result = graph.run(4).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn unmet_dependency_is_reported_instead_of_hanging() {
        let mut graph = StageGraph::new();
        graph.add_stage("only", &["missing"], |_| async { Ok(json!(1)) });

        let result = graph.run(4).await;
        assert!(result.is_err());
    }
}
