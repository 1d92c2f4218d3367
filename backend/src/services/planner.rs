//! End-to-end session planning.
//!
//! One pipeline serves every prompt variant: validate the inputs, compute the
//! moon reading and optics profile, build the brief, call the reasoning
//! service under a timeout (retrying once on a fallback model if configured),
//! and normalize whatever comes back. Callers always get a structurally valid
//! [`Plan`] unless their input was invalid.

use log::{debug, info, warn};
use std::sync::Arc;
use std::time::Duration;

use crate::config::{PlannerConfig, ServiceConfig};
use crate::error::PlannerResult;
use crate::models::{OpticsProfile, Plan, PlanRequest, SessionInput};
use crate::services::brief::{build_brief, MissionBrief, PromptProfile};
use crate::services::normalizer::{resolve_outcome, GroundTruth};
use crate::services::optics::{lookup_optics, resolve_optics};
use crate::services::reasoning::{ReasoningReply, ReasoningRequest, ReasoningService, ServiceFailure};

/// Model and sampling settings for the reasoning call.
#[derive(Debug, Clone, PartialEq)]
pub struct ServiceSettings {
    pub model: String,
    /// Model tried once when the primary call fails.
    pub fallback_model: Option<String>,
    pub temperature: f32,
    pub timeout: Duration,
}

impl Default for ServiceSettings {
    fn default() -> Self {
        Self::from(&ServiceConfig::default())
    }
}

impl From<&ServiceConfig> for ServiceSettings {
    fn from(config: &ServiceConfig) -> Self {
        Self {
            model: config.model.clone(),
            fallback_model: config
                .fallback_model
                .clone()
                .filter(|m| !m.trim().is_empty() && *m != config.model),
            temperature: config.temperature,
            timeout: Duration::from_secs(config.timeout_secs),
        }
    }
}

/// Planning pipeline with an injected reasoning service.
///
/// Cheap to share: wrap in an `Arc` and call concurrently, there is no mutable
/// state.
pub struct SessionPlanner {
    service: Arc<dyn ReasoningService>,
    settings: ServiceSettings,
    prompt: PromptProfile,
}

impl SessionPlanner {
    pub fn new(service: Arc<dyn ReasoningService>, settings: ServiceSettings, prompt: PromptProfile) -> Self {
        Self {
            service,
            settings,
            prompt,
        }
    }

    /// Build a planner from loaded configuration.
    pub fn from_config(service: Arc<dyn ReasoningService>, config: &PlannerConfig) -> Self {
        Self::new(service, ServiceSettings::from(&config.service), config.prompt.clone())
    }

    pub fn settings(&self) -> &ServiceSettings {
        &self.settings
    }

    pub fn prompt(&self) -> &PromptProfile {
        &self.prompt
    }

    /// Provider name of the injected service.
    pub fn provider(&self) -> &str {
        self.service.provider()
    }

    /// Optics profile for display, before any plan is requested.
    pub fn lookup_optics(&self, equipment: Option<&str>) -> OpticsProfile {
        lookup_optics(equipment)
    }

    /// Produce a plan for one session.
    ///
    /// # Errors
    ///
    /// Only [`crate::error::PlannerError::InvalidInput`], raised before any
    /// external call. Service and output failures come back as a fallback plan
    /// with `error` set.
    pub async fn plan_session(&self, input: &SessionInput) -> PlannerResult<Plan> {
        let request = PlanRequest::from_input(input)?;
        let truth = GroundTruth::for_request(&request);
        let optics = resolve_optics(&request.equipment_id);

        info!(
            "planning session {} at '{}' with {} (moon {})",
            request.session_date, request.location, optics.canonical_name, truth.moon
        );

        let brief = build_brief(&request, &truth.moon, &optics, &self.prompt)?;
        debug!(
            "brief {} (prompt {}, {} chars)",
            brief.fingerprint(),
            self.prompt.version,
            brief.content.len()
        );

        let outcome = self.request_plan(&brief).await;
        let plan = resolve_outcome(outcome, &truth);
        if let Some(reason) = &plan.error {
            warn!("returning degraded plan: {}", reason);
        }
        Ok(plan)
    }

    /// Call the service with the primary model, then once with the fallback
    /// model if the first call failed.
    async fn request_plan(&self, brief: &MissionBrief) -> Result<ReasoningReply, ServiceFailure> {
        let primary = self.call(&self.settings.model, brief).await;
        let failure = match primary {
            Ok(reply) => return Ok(reply),
            Err(failure) => failure,
        };

        match &self.settings.fallback_model {
            Some(fallback) => {
                warn!(
                    "{} failed ({}); retrying once with {}",
                    self.settings.model, failure, fallback
                );
                self.call(fallback, brief).await
            }
            None => Err(failure),
        }
    }

    async fn call(&self, model: &str, brief: &MissionBrief) -> Result<ReasoningReply, ServiceFailure> {
        let request = ReasoningRequest {
            model: model.to_string(),
            content: brief.content.clone(),
            instruction: brief.instruction.clone(),
            temperature: self.settings.temperature,
            structured_output: true,
        };

        match tokio::time::timeout(self.settings.timeout, self.service.generate(&request)).await {
            Ok(result) => result,
            Err(_) => Err(ServiceFailure::timeout(format!(
                "{} did not answer within {} s",
                model,
                self.settings.timeout.as_secs()
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::reasoning::FailureKind;
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// Replays canned outcomes and records the models it was asked for.
    struct Scripted {
        outcomes: Mutex<Vec<Result<String, ServiceFailure>>>,
        models: Mutex<Vec<String>>,
        delay: Option<Duration>,
    }

    impl Scripted {
        fn new(outcomes: Vec<Result<String, ServiceFailure>>) -> Self {
            Self {
                outcomes: Mutex::new(outcomes),
                models: Mutex::new(Vec::new()),
                delay: None,
            }
        }
    }

    #[async_trait]
    impl ReasoningService for Scripted {
        async fn generate(&self, request: &ReasoningRequest) -> Result<ReasoningReply, ServiceFailure> {
            self.models.lock().unwrap().push(request.model.clone());
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

    fn settings(fallback: Option<&str>) -> ServiceSettings {
        ServiceSettings {
            model: "primary".into(),
            fallback_model: fallback.map(str::to_string),
            temperature: 0.2,
            timeout: Duration::from_secs(5),
        }
    }

    fn input() -> SessionInput {
        SessionInput::new("Joshua Tree, CA", "Seestar S50", "2025-12-04")
    }

    #[tokio::test]
    async fn test_successful_plan() {
        let service = Arc::new(Scripted::new(vec![Ok(r#"{"targets":[{"name":"M42"}]}"#.into())]));
        let planner = SessionPlanner::new(service.clone(), settings(None), PromptProfile::default());
        let plan = planner.plan_session(&input()).await.unwrap();
        assert_eq!(plan.targets[0].name, "M42");
        assert_eq!(plan.summary.moon_phase, "Waxing Gibbous (95%)");
        assert_eq!(plan.calendar_display, "December 2025");
        assert_eq!(*service.models.lock().unwrap(), vec!["primary".to_string()]);
    }

    #[tokio::test]
    async fn test_retry_on_fallback_model() {
        let service = Arc::new(Scripted::new(vec![
            Err(ServiceFailure::rate_limited("quota")),
            Ok(r#"{"targets":["M31"]}"#.into()),
        ]));
        let planner = SessionPlanner::new(service.clone(), settings(Some("backup")), PromptProfile::default());
        let plan = planner.plan_session(&input()).await.unwrap();
        assert!(!plan.is_degraded());
        assert_eq!(plan.targets[0].name, "M31");
        assert_eq!(
            *service.models.lock().unwrap(),
            vec!["primary".to_string(), "backup".to_string()]
        );
    }

    #[tokio::test]
    async fn test_no_retry_without_fallback_model() {
        let service = Arc::new(Scripted::new(vec![
            Err(ServiceFailure::rate_limited("quota")),
            Ok(r#"{"targets":["M31"]}"#.into()),
        ]));
        let planner = SessionPlanner::new(service.clone(), settings(None), PromptProfile::default());
        let plan = planner.plan_session(&input()).await.unwrap();
        assert!(plan.error.unwrap().starts_with("Quota exceeded"));
        assert_eq!(service.models.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_timeout_becomes_fallback() {
        let mut scripted = Scripted::new(vec![Ok(r#"{"targets":["M42"]}"#.into())]);
        scripted.delay = Some(Duration::from_millis(200));
        let planner = SessionPlanner::new(
            Arc::new(scripted),
            ServiceSettings {
                timeout: Duration::from_millis(20),
                ..settings(None)
            },
            PromptProfile::default(),
        );
        let plan = planner.plan_session(&input()).await.unwrap();
        assert_eq!(plan.targets.len(), 3);
        assert!(plan.error.unwrap().starts_with("Service unavailable"));
    }

    #[tokio::test]
    async fn test_invalid_input_makes_no_call() {
        let service = Arc::new(Scripted::new(vec![]));
        let planner = SessionPlanner::new(service.clone(), settings(Some("backup")), PromptProfile::default());
        let err = planner
            .plan_session(&SessionInput::new("", "Seestar S50", "2025-12-04"))
            .await
            .unwrap_err();
        assert!(err.is_invalid_input());
        assert!(service.models.lock().unwrap().is_empty());
    }

    #[test]
    fn test_settings_drop_redundant_fallback() {
        let config = ServiceConfig {
            model: "gemini-flash-latest".into(),
            fallback_model: Some("gemini-flash-latest".into()),
            ..ServiceConfig::default()
        };
        assert_eq!(ServiceSettings::from(&config).fallback_model, None);
        assert_eq!(FailureKind::Timeout, ServiceFailure::timeout("x").kind);
    }

    #[test]
    fn test_lookup_optics_delegates() {
        let planner = SessionPlanner::new(Arc::new(Scripted::new(vec![])), settings(None), PromptProfile::default());
        assert_eq!(planner.lookup_optics(Some("Dwarf II")).canonical_name, "Dwarf II");
        assert_eq!(planner.lookup_optics(None).canonical_name, "Generic Telescope");
        assert_eq!(planner.provider(), "scripted");
    }
}
