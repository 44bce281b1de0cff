//! The two comparison views.
//!
//! Each view owns its own [`ComparisonRun`]; constructing two views gives two
//! independent states.

use crate::binder::{self, Banner, SlotView};
use crate::client::{ChatBackend, ChatParams};
use crate::compare::{ComparisonRun, Submission, Temperature};
use crate::providers::Deployment;

/// Temperature used for every request of the deployment comparison.
pub const DEPLOYMENT_COMPARISON_TEMPERATURE: f64 = 0.7;

/// Same prompt, every deployment, fixed temperature.
#[derive(Debug, Clone)]
pub struct DeploymentComparison {
    run: ComparisonRun<Deployment>,
}

impl DeploymentComparison {
    pub const TITLE: &'static str = "Compare Deployments";

    pub fn new() -> Self {
        Self::with_temperature(DEPLOYMENT_COMPARISON_TEMPERATURE)
    }

    pub fn with_temperature(temperature: f64) -> Self {
        Self {
            run: ComparisonRun::new(
                Deployment::ALL.to_vec(),
                ChatParams::new(temperature, Deployment::OpenAi),
            ),
        }
    }

    pub fn run(&self) -> &ComparisonRun<Deployment> {
        &self.run
    }

    pub fn run_mut(&mut self) -> &mut ComparisonRun<Deployment> {
        &mut self.run
    }

    pub fn submit(&mut self, prompt: &str) -> Submission<Deployment> {
        self.run.submit(prompt)
    }

    pub async fn compare<B: ChatBackend>(&mut self, prompt: &str, backend: &B) -> Submission<Deployment> {
        self.run.run(prompt, backend).await
    }

    pub fn slots(&self) -> Vec<SlotView<'_, Deployment>> {
        binder::bind(&self.run)
    }

    pub fn banner(&self) -> Banner<'_> {
        binder::banner(&self.run)
    }
}

impl Default for DeploymentComparison {
    fn default() -> Self {
        Self::new()
    }
}

/// Same prompt, one deployment, every standard temperature.
#[derive(Debug, Clone)]
pub struct TemperatureComparison {
    run: ComparisonRun<Temperature>,
}

impl TemperatureComparison {
    pub const TITLE: &'static str = "Compare Temperatures";

    pub fn new(deployment: Deployment) -> Self {
        Self {
            // temperature in the base is overridden by every variant
            run: ComparisonRun::new(
                Temperature::STANDARD.to_vec(),
                ChatParams::new(DEPLOYMENT_COMPARISON_TEMPERATURE, deployment),
            ),
        }
    }

    pub fn deployment(&self) -> Deployment {
        self.run.base_params().deployment
    }

    /// Select the deployment for the next run. A run in progress keeps the
    /// deployment it started with.
    pub fn select_deployment(&mut self, deployment: Deployment) {
        let params = ChatParams {
            deployment,
            ..self.run.base_params()
        };
        self.run.set_base_params(params);
    }

    pub fn run(&self) -> &ComparisonRun<Temperature> {
        &self.run
    }

    pub fn run_mut(&mut self) -> &mut ComparisonRun<Temperature> {
        &mut self.run
    }

    pub fn submit(&mut self, prompt: &str) -> Submission<Temperature> {
        self.run.submit(prompt)
    }

    pub async fn compare<B: ChatBackend>(&mut self, prompt: &str, backend: &B) -> Submission<Temperature> {
        self.run.run(prompt, backend).await
    }

    pub fn slots(&self) -> Vec<SlotView<'_, Temperature>> {
        binder::bind(&self.run)
    }

    pub fn banner(&self) -> Banner<'_> {
        binder::banner(&self.run)
    }
}

impl Default for TemperatureComparison {
    fn default() -> Self {
        Self::new(Deployment::OpenAi)
    }
}
