#![allow(dead_code)]

use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use starlight_planner::services::{
    PromptProfile, ReasoningReply, ReasoningRequest, ReasoningService, ServiceFailure,
    ServiceSettings, SessionPlanner,
};

static ENV_LOCK: Mutex<()> = Mutex::new(());

/// Runs `f` with environment variables temporarily modified.
///
/// This is panic-safe (restores variables on unwind) and also serializes access to
/// process-global env vars to avoid flaky tests when Rust runs tests in parallel.
///
/// `changes` is a list of `(key, value)` pairs:
/// - `Some(v)` sets the variable to `v`
/// - `None` removes the variable
pub fn with_scoped_env<F, R>(changes: &[(&str, Option<&str>)], f: F) -> R
where
    F: FnOnce() -> R,
{
    let _lock = ENV_LOCK.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
    let _guard = ScopedEnv::new(changes);
    f()
}

struct ScopedEnv {
    snapshot: Vec<(String, Option<String>)>,
}

impl ScopedEnv {
    fn new(changes: &[(&str, Option<&str>)]) -> Self {
        let keys: HashSet<&str> = changes.iter().map(|(k, _)| *k).collect();
        let snapshot = keys
            .into_iter()
            .map(|k| (k.to_string(), std::env::var(k).ok()))
            .collect::<Vec<_>>();

        for (k, v) in changes {
            match v {
                Some(val) => std::env::set_var(k, val),
                None => std::env::remove_var(k),
            }
        }

        Self { snapshot }
    }
}

impl Drop for ScopedEnv {
    fn drop(&mut self) {
        for (k, v) in self.snapshot.drain(..) {
            match v {
                Some(val) => std::env::set_var(&k, val),
                None => std::env::remove_var(&k),
            }
        }
    }
}

/// Reasoning service that replays canned outcomes in order and records every
/// request it receives. Once the script runs out it reports the service as
/// unavailable.
#[derive(Default)]
pub struct ScriptedService {
    outcomes: Mutex<Vec<Result<String, ServiceFailure>>>,
    requests: Mutex<Vec<ReasoningRequest>>,
    delay: Option<Duration>,
}

impl ScriptedService {
    pub fn new(outcomes: Vec<Result<String, ServiceFailure>>) -> Self {
        Self {
            outcomes: Mutex::new(outcomes),
            ..Default::default()
        }
    }

    pub fn replying(text: &str) -> Self {
        Self::new(vec![Ok(text.to_string())])
    }

    pub fn failing(failure: ServiceFailure) -> Self {
        Self::new(vec![Err(failure)])
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn requests(&self) -> Vec<ReasoningRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

#[async_trait]
impl ReasoningService for ScriptedService {
    async fn generate(&self, request: &ReasoningRequest) -> Result<ReasoningReply, ServiceFailure> {
        self.requests.lock().unwrap().push(request.clone());
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        let next = {
            let mut outcomes = self.outcomes.lock().unwrap();
            if outcomes.is_empty() {
                Err(ServiceFailure::unavailable("script exhausted"))
            } else {
                outcomes.remove(0)
            }
        };
        next.map(|text| ReasoningReply { text })
    }

    fn provider(&self) -> &str {
        "scripted"
    }
}

pub fn test_settings() -> ServiceSettings {
    ServiceSettings {
        model: "primary-model".to_string(),
        fallback_model: None,
        temperature: 0.2,
        timeout: Duration::from_secs(5),
    }
}

pub fn planner_with(service: Arc<ScriptedService>) -> SessionPlanner {
    SessionPlanner::new(service, test_settings(), PromptProfile::default())
}

/// A well-formed reply in the shape the schema contract asks for.
pub const GOOD_REPLY: &str = r#"{
  "summary": {
    "moonPhase": "Full Moon (100%)",
    "weather": "Clear skies expected after 21:00.",
    "score": 82,
    "strategy": "Start wide, finish on galaxies once the moon sets."
  },
  "targets": [
    {
      "name": "Orion Nebula (M42)",
      "type": "Nebula",
      "why": "Bright enough to cut through moonlight.",
      "settings": { "exposure": "10s", "gain": "60", "filter": "Dual-band", "binning": "1x1", "irMode": "Astro" },
      "tips": ["Stack at least 30 minutes", "Use dithering"]
    },
    {
      "name": "Pleiades (M45)",
      "type": "Open Cluster",
      "why": "Fills the field nicely.",
      "settings": { "exposure": "15s", "gain": "40", "filter": "None", "binning": "1x1", "irMode": "Vis" },
      "tips": ["Watch for dew"]
    }
  ],
  "events": [
    { "date": "2025-12-13", "name": "Geminids peak", "type": "Meteor Shower", "desc": "Up to 120 per hour." }
  ]
}"#;
