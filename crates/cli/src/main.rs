mod logging;

use anyhow::Result;
use clap::Parser;
use colored::Colorize;
use runtime::config::{LOG_FILE_NAME, MODEL_DIR_NAME};
use runtime::{JobConfig, JobOutcome, RecommendationJob};
use std::io::Write;
use std::path::PathBuf;
use tracing::error;

/// Generate top-N recommendations for a fixed set of users from a saved ALS model
#[derive(Parser, Debug)]
#[command(name = "als-recs")]
#[command(about = "Batch recommendations from a saved ALS model", long_about = None)]
struct Cli {
    /// Directory holding the previous training run's results
    #[arg(long)]
    previous_output_dir: Option<PathBuf>,

    /// Saved model path (overrides --previous-output-dir)
    #[arg(long)]
    model_path: Option<PathBuf>,

    /// Directory for the log file
    #[arg(long)]
    output_dir: Option<PathBuf>,

    /// User column the model was trained on
    #[arg(long)]
    user_col: Option<String>,

    /// Users to recommend for (comma separated)
    #[arg(long, value_delimiter = ',')]
    users: Option<Vec<i32>>,

    /// Recommendations per user
    #[arg(short = 'n', long)]
    num_recommendations: Option<usize>,

    /// Worker threads: local[*] or local[N]
    #[arg(long)]
    master: Option<String>,

    /// Maximum model size, e.g. 4g
    #[arg(long)]
    driver_memory: Option<String>,

    /// Scoring memory per user task, e.g. 4g
    #[arg(long)]
    executor_memory: Option<String>,

    /// Largest single factor record, e.g. 512m
    #[arg(long)]
    serializer_buffer_max: Option<String>,
}

impl Cli {
    fn into_config(self) -> JobConfig {
        let mut config = JobConfig::default();
        if let Some(dir) = self.previous_output_dir {
            config.model_path = dir.join(MODEL_DIR_NAME);
        }
        if let Some(path) = self.model_path {
            config.model_path = path;
        }
        if let Some(dir) = self.output_dir {
            config.log_file = dir.join(LOG_FILE_NAME);
            config.output_dir = dir;
        }
        if let Some(column) = self.user_col {
            config.user_col = column;
        }
        if let Some(users) = self.users {
            config.user_ids = users;
        }
        if let Some(n) = self.num_recommendations {
            config.num_recommendations = n;
        }
        if let Some(master) = self.master {
            config.master = master;
        }
        if let Some(memory) = self.driver_memory {
            config.driver_memory = memory;
        }
        if let Some(memory) = self.executor_memory {
            config.executor_memory = memory;
        }
        if let Some(size) = self.serializer_buffer_max {
            config.serializer_buffer_max = size;
        }
        config
    }
}

fn main() -> Result<()> {
    let config = Cli::parse().into_config();
    logging::init(&config.log_file)?;

    eprintln!(
        "{} {}",
        "Recommending from".bold().blue(),
        config.model_path.display()
    );

    run(config, &mut std::io::stdout().lock());
    Ok(())
}

/// Run the job once.
///
/// A session that can't be created ends the run after logging, with the
/// same exit status as any other run.
fn run<W: Write>(config: JobConfig, out: &mut W) -> Option<JobOutcome> {
    let job = RecommendationJob::new(config);
    match job.run(out) {
        Ok(report) => {
            if let JobOutcome::Failed { last_stage, .. } = &report.outcome {
                eprintln!("{} job stopped after {:?}", "✗".red(), last_stage);
            }
            Some(report.outcome)
        }
        Err(e) => {
            error!("Terminating: {}", e);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_config() {
        let cli = Cli::parse_from(["als-recs"]);
        assert_eq!(cli.into_config(), JobConfig::default());
    }

    #[test]
    fn test_overrides() {
        let cli = Cli::parse_from([
            "als-recs",
            "--previous-output-dir",
            "/tmp/run",
            "--output-dir",
            "/tmp/out",
            "--users",
            "1,2,3",
            "-n",
            "10",
            "--master",
            "local[2]",
            "--user-col",
            "user",
        ]);
        let config = cli.into_config();
        assert_eq!(config.model_path, PathBuf::from("/tmp/run/als_model_hashing"));
        assert_eq!(
            config.log_file,
            PathBuf::from("/tmp/out/generate_recommendations.log")
        );
        assert_eq!(config.user_ids, vec![1, 2, 3]);
        assert_eq!(config.num_recommendations, 10);
        assert_eq!(config.master, "local[2]");
        assert_eq!(config.user_col, "user");
        assert_eq!(config.driver_memory, "4g");
    }

    #[test]
    fn test_bootstrap_failure_ends_run_quietly() {
        let cli = Cli::parse_from(["als-recs", "--driver-memory", "lots"]);
        let mut out = Vec::new();
        assert_eq!(run(cli.into_config(), &mut out), None);
        assert!(out.is_empty());
    }

    #[test]
    fn test_missing_model_still_reports_timing() {
        let cli = Cli::parse_from([
            "als-recs",
            "--model-path",
            "/definitely/not/a/model",
            "--master",
            "local[1]",
        ]);
        let mut out = Vec::new();
        let outcome = run(cli.into_config(), &mut out);

        assert!(matches!(outcome, Some(JobOutcome::Failed { .. })));
        assert!(String::from_utf8(out).unwrap().contains("Total time taken: "));
    }

    #[test]
    fn test_model_path_wins() {
        let cli = Cli::parse_from([
            "als-recs",
            "--model-path",
            "/models/a",
            "--previous-output-dir",
            "/tmp/run",
        ]);
        assert_eq!(cli.into_config().model_path, PathBuf::from("/models/a"));
    }
}
