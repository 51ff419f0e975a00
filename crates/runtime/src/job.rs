//! # Recommendation Job
//!
//! Runs one batch of recommendations end to end:
//! 1. Start a session (fatal on failure)
//! 2. Load the saved ALS model
//! 3. Build the user table and compute top-N recommendations
//! 4. Clamp ratings to the rating scale
//! 5. Report one summary line per user
//! 6. Stop the session (always, once the session exists)
//!
//! Stages 2-5 return `Result`; the first failure is logged and the job
//! falls through to stage 6. Nothing is printed unless every stage succeeds.

use std::io::Write;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use tracing::{error, info, warn};

use model_loader::AlsModel;
use pipeline::report::{self, format_report};
use pipeline::{ClampRatings, PostProcessPipeline, ScoreBounds};
use recommender::{RecommendationTable, UserRecommendations};

use crate::config::JobConfig;
use crate::session::{Session, SessionError};

/// Where the job is in its linear lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Start,
    RuntimeReady,
    ModelLoaded,
    RecommendationsComputed,
    Clamped,
    Reported,
    RuntimeStopped,
}

/// How the stages between session start and stop ended
#[derive(Debug, Clone, PartialEq)]
pub enum JobOutcome {
    /// Every stage ran; one line was reported per returned user
    Completed { users_reported: usize },
    /// A stage failed after `last_stage` had been reached
    Failed { last_stage: Stage, error: String },
}

/// Summary of one run whose session started
#[derive(Debug, Clone)]
pub struct RunReport {
    /// Stages in the order they were reached
    pub stages: Vec<Stage>,
    pub outcome: JobOutcome,
    pub elapsed: Duration,
}

impl RunReport {
    pub fn succeeded(&self) -> bool {
        matches!(self.outcome, JobOutcome::Completed { .. })
    }
}

/// Batch job that recommends items for a fixed list of users
pub struct RecommendationJob {
    config: JobConfig,
    post_process: PostProcessPipeline,
}

impl RecommendationJob {
    pub fn new(config: JobConfig) -> Self {
        Self::with_bounds(config, ScoreBounds::default())
    }

    pub fn with_bounds(config: JobConfig, bounds: ScoreBounds) -> Self {
        let post_process = PostProcessPipeline::new().add_processor(ClampRatings::new(bounds));
        Self {
            config,
            post_process,
        }
    }

    pub fn config(&self) -> &JobConfig {
        &self.config
    }

    /// Run the whole job, writing the report and timing lines to `out`.
    ///
    /// Returns `Err` only when the session can't be created; in that case
    /// nothing was acquired and nothing is stopped.
    pub fn run<W: Write>(&self, out: &mut W) -> std::result::Result<RunReport, SessionError> {
        let start_time = Instant::now();
        info!("{}", "=".repeat(50));
        info!("Recommendation Generation Started.");

        let mut stages = vec![Stage::Start];

        let session = match self.start_session() {
            Ok(session) => session,
            Err(e) => {
                error!("Fatal error creating session: {}", e);
                error!("{:?}", e);
                return Err(e);
            }
        };
        stages.push(Stage::RuntimeReady);

        let outcome = match self.run_stages(&session, &mut stages, out) {
            Ok(users_reported) => JobOutcome::Completed { users_reported },
            Err(e) => {
                error!("An error occurred during model loading or recommendation: {}", e);
                error!("{:?}", e);
                JobOutcome::Failed {
                    last_stage: stages.last().copied().unwrap_or(Stage::RuntimeReady),
                    error: format!("{:#}", e),
                }
            }
        };

        info!("Stopping session...");
        session.stop();
        stages.push(Stage::RuntimeStopped);

        let elapsed = start_time.elapsed();
        info!("--- Recommendation Generation Completed ---");
        info!("Total time taken: {:.2} seconds", elapsed.as_secs_f64());
        if let Err(e) = write_timing(out, elapsed) {
            warn!("Failed to write timing summary: {}", e);
        }

        Ok(RunReport {
            stages,
            outcome,
            elapsed,
        })
    }

    /// Create the session from the configured resources
    fn start_session(&self) -> std::result::Result<Session, SessionError> {
        info!("Initializing session...");
        let session = Session::builder()
            .app_name(&self.config.app_name)
            .master(&self.config.master)
            .driver_memory(&self.config.driver_memory)
            .executor_memory(&self.config.executor_memory)
            .serializer_buffer_max(&self.config.serializer_buffer_max)
            .get_or_create()?;

        info!(
            "Session created. Runtime version: {}, workers: {}",
            session.version(),
            session.num_workers()
        );
        info!(
            "Driver Memory: {}, Executor Memory: {}",
            session.driver_memory(),
            session.executor_memory()
        );
        Ok(session)
    }

    /// Stages between session start and stop; returns the number of users reported
    fn run_stages<W: Write>(
        &self,
        session: &Session,
        stages: &mut Vec<Stage>,
        out: &mut W,
    ) -> Result<usize> {
        let model = Arc::new(self.load_model(session)?);
        stages.push(Stage::ModelLoaded);

        let raw = self.compute_recommendations(session, model.clone())?;
        stages.push(Stage::RecommendationsComputed);

        let clamped = self.clamp(raw, model.user_col())?;
        stages.push(Stage::Clamped);

        let lines = format_report(&clamped);
        report::write_report(out, &lines).context("Failed to write recommendation report")?;
        stages.push(Stage::Reported);

        Ok(lines.len())
    }

    fn load_model(&self, session: &Session) -> Result<AlsModel> {
        info!(
            "Loading saved ALS model from: {}",
            self.config.model_path.display()
        );
        let model = session
            .load_model(&self.config.model_path)
            .with_context(|| {
                format!(
                    "Failed to load ALS model from {}",
                    self.config.model_path.display()
                )
            })?;
        info!("ALS model loaded successfully.");
        Ok(model)
    }

    fn compute_recommendations(
        &self,
        session: &Session,
        model: Arc<AlsModel>,
    ) -> Result<Vec<UserRecommendations>> {
        let users = session
            .create_user_table(&self.config.user_col, self.config.user_ids.iter().copied());
        info!("Created user table for users: {:?}", self.config.user_ids);
        info!("\n{}", users);

        let n = self.config.num_recommendations;
        info!("Generating top {} recommendations...", n);
        let recommender = session.recommender(model.clone());
        let rows = session
            .install(|| recommender.recommend_for_user_subset(&users, n))
            .context("Failed to compute recommendations")?;

        if rows.len() < users.len() {
            warn!(
                "Recommendations returned for {} of {} requested users",
                rows.len(),
                users.len()
            );
        }
        info!("Generated raw recommendations.");
        info!(
            "\n{}",
            RecommendationTable {
                user_col: model.user_col(),
                column: "recommendations",
                rows: &rows,
            }
        );
        Ok(rows)
    }

    fn clamp(
        &self,
        rows: Vec<UserRecommendations>,
        user_col: &str,
    ) -> Result<Vec<UserRecommendations>> {
        info!("Clipping recommendation ratings...");
        let clamped = self
            .post_process
            .apply(rows)
            .context("Failed to clip recommendation ratings")?;
        info!("Recommendation ratings clipped.");
        info!(
            "\n{}",
            RecommendationTable {
                user_col,
                column: "recommendations_clipped",
                rows: &clamped,
            }
        );
        Ok(clamped)
    }
}

fn write_timing<W: Write>(out: &mut W, elapsed: Duration) -> std::io::Result<()> {
    writeln!(out)?;
    writeln!(out, "--- Recommendation Generation Completed ---")?;
    writeln!(out, "Total time taken: {:.2} seconds", elapsed.as_secs_f64())?;
    out.flush()
}
